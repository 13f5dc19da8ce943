//! sitepush: deploy a static site to S3 buckets.
//!
//! # Usage
//!
//! ```text
//! sitepush [--config sitepush.yaml] [--region <region>] check
//! sitepush deploy
//! sitepush teardown --yes
//! sitepush sync [--dir public] [--dry-run] [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, deploy::DeployArgs, sync::SyncArgs, teardown::TeardownArgs};
use sitepush_core::config::DEFAULT_CONFIG_FILE;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "sitepush",
    version,
    about = "Provision S3 website buckets and sync a static site into them",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Site configuration file.
    #[arg(long, global = true, env = "SITEPUSH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Region override; takes precedence over the configuration file.
    #[arg(long, global = true)]
    pub region: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify every configured bucket exists.
    Check(CheckArgs),

    /// Create missing buckets and configure them for public website hosting.
    Deploy(DeployArgs),

    /// Empty and delete every configured bucket.
    Teardown(TeardownArgs),

    /// Upload changed files to the site bucket and delete orphaned keys.
    Sync(SyncArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => args.run(&cli.global).await,
        Commands::Deploy(args) => args.run(&cli.global).await,
        Commands::Teardown(args) => args.run(&cli.global).await,
        Commands::Sync(args) => args.run(&cli.global).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
