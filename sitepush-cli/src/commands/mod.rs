//! Subcommand implementations.

pub mod check;
pub mod deploy;
pub mod sync;
pub mod teardown;

use anyhow::{Context, Result};
use sitepush_core::{config, SiteConfig};
use sitepush_s3::S3Store;

use crate::GlobalArgs;

/// Load and validate the configuration named by `--config`.
pub fn load_config(global: &GlobalArgs) -> Result<SiteConfig> {
    config::load_at(&global.config)
        .with_context(|| format!("failed to load {}", global.config.display()))
}

/// S3 client for the `--region` flag, else the configured region, else the
/// default provider chain.
pub async fn connect(global: &GlobalArgs, config: &SiteConfig) -> S3Store {
    let region = global.region.clone().or_else(|| config.region.clone());
    tracing::debug!(region = ?region, "connecting");
    S3Store::from_env(region).await
}
