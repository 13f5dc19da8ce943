//! `sitepush teardown`: empty and delete every configured bucket.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use crate::commands::{connect, load_config};
use crate::GlobalArgs;

/// Arguments for `sitepush teardown`.
#[derive(Args, Debug)]
pub struct TeardownArgs {
    /// Confirm that every object and bucket may be deleted.
    #[arg(long)]
    pub yes: bool,
}

impl TeardownArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        if !self.yes {
            bail!("teardown deletes every configured bucket and its contents; pass --yes to confirm");
        }
        let config = load_config(global)?;
        let store = connect(global, &config).await;

        sitepush_bucket::teardown(&store, &config)
            .await
            .context("teardown failed")?;

        for bucket in &config.buckets {
            println!("{} {} deleted", "✗".red().bold(), bucket.name);
        }
        Ok(())
    }
}
