use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use pagemap_router::{RouteChange, RouteWatcher};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::{block_on, load_store};

pub fn execute(config_path: &Path) -> Result<()> {
    block_on(run(config_path))?
}

async fn run(config_path: &Path) -> Result<()> {
    let (config, store) = load_store(config_path).await?;

    println!("{}", "Watching page directories...".green().bold());
    println!();
    super::routes::print_table(&store.snapshot());
    println!();

    if !config.dev.hot_reload {
        println!("{}", "⚠ Hot reload is disabled in the configuration".yellow());
        return Ok(());
    }

    let watcher = RouteWatcher::spawn(store, Duration::from_millis(config.dev.debounce_ms))?;
    let handle = watcher.handle();
    let mut changes = handle.subscribe();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                println!();
                println!("{}", "Stopped".dimmed());
                return Ok(());
            }
            change = changes.recv() => match change {
                Ok(change) => {
                    print_change(&change);
                    println!("    {} routes", handle.snapshot().len().to_string().dimmed());
                }
                Err(RecvError::Lagged(skipped)) => warn!("Missed {} route changes", skipped),
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }
}

fn print_change(change: &RouteChange) {
    match change {
        RouteChange::Added { file, pattern } => {
            println!("  {} {} {}", "+".green(), pattern.cyan(), file.display());
        }
        RouteChange::Removed { file, pattern } => {
            println!("  {} {} {}", "-".red(), pattern.cyan(), file.display());
        }
        RouteChange::Rejected { error, .. } => {
            println!("  {} {}", "⚠".yellow(), error);
        }
    }
}
