//! `sitepush sync`: upload changed files into the site bucket.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use sitepush_core::config;
use sitepush_sync::{scan_dir, OperationKind, SyncReport};

use crate::commands::{connect, load_config};
use crate::GlobalArgs;

/// Arguments for `sitepush sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory holding the built site.
    #[arg(long, default_value = "public")]
    pub dir: PathBuf,

    /// Show what would change without touching the bucket.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = load_config(global)?;
        let site = config::site_bucket(&config).context("nothing to sync into")?;
        let manifest = scan_dir(&self.dir)
            .with_context(|| format!("failed to scan {}", self.dir.display()))?;

        let store = connect(global, &config).await;
        sitepush_bucket::check_bucket(&store, site)
            .await
            .context("run `sitepush deploy` first")?;

        let report = sitepush_sync::sync(&store, &site.name, &manifest, self.dry_run)
            .await
            .with_context(|| format!("sync failed for {}", site.name))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize sync JSON")?
            );
            return Ok(());
        }
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    if report.is_noop() {
        println!("{prefix}✓ {}: no file sync required", report.bucket);
        return;
    }

    println!(
        "{prefix}✓ {} synced ({} added, {} updated, {} deleted, {} unchanged)",
        report.bucket,
        report.count(OperationKind::Add),
        report.count(OperationKind::Update),
        report.count(OperationKind::Delete),
        report.unchanged,
    );
    for op in &report.operations {
        let marker = match op.kind {
            OperationKind::Add => "+".green(),
            OperationKind::Update => "~".yellow(),
            OperationKind::Delete => "-".red(),
        };
        println!("  {marker}  {}", op.key);
    }
}
