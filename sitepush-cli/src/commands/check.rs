//! `sitepush check`: confirm every configured bucket exists.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::commands::{connect, load_config};
use crate::GlobalArgs;

/// Arguments for `sitepush check`.
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = load_config(global)?;
        let store = connect(global, &config).await;

        sitepush_bucket::check(&store, &config)
            .await
            .context("bucket check failed; run `sitepush deploy` first")?;

        for bucket in &config.buckets {
            println!("{} {}", "✓".green().bold(), bucket.name);
        }
        Ok(())
    }
}
