pub mod manifest;
pub mod resolve;
pub mod routes;
pub mod watch;

use std::future::Future;
use std::path::Path;

use anyhow::{Context, Result};
use pagemap_router::{Config, RouteStore};

/// Runs an async command body on a fresh multi-threaded runtime
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?
        .block_on(future))
}

/// Loads the configuration and performs the startup scan
pub async fn load_store(config_path: &Path) -> Result<(Config, RouteStore)> {
    let config = Config::load(config_path)?;
    let store = RouteStore::from_config(&config)
        .await
        .with_context(|| format!("Failed to load routes for {:?}", config.project.root))?;
    Ok((config, store))
}
