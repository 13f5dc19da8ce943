//! `sitepush deploy`: provision and configure every bucket.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use sitepush_bucket::DeployOutcome;

use crate::commands::{connect, load_config};
use crate::GlobalArgs;

/// Arguments for `sitepush deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct DeployRow {
    #[tabled(rename = "bucket")]
    bucket: String,
    #[tabled(rename = "mode")]
    mode: &'static str,
    #[tabled(rename = "created")]
    created: &'static str,
}

impl DeployArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = load_config(global)?;
        let store = connect(global, &config).await;

        let outcomes = sitepush_bucket::deploy(&store, &config)
            .await
            .context("deploy failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcomes).context("failed to serialize deploy JSON")?
            );
            return Ok(());
        }
        print_table(&outcomes);
        Ok(())
    }
}

fn print_table(outcomes: &[DeployOutcome]) {
    if outcomes.is_empty() {
        println!("No buckets configured.");
        return;
    }
    let rows: Vec<DeployRow> = outcomes
        .iter()
        .map(|outcome| DeployRow {
            bucket: outcome.bucket.to_string(),
            mode: outcome.mode,
            created: if outcome.created { "yes" } else { "no" },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{} {} bucket(s) deployed", "✓".green().bold(), outcomes.len());
}
