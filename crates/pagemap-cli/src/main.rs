mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagemap")]
#[command(version, about = "pagemap - file-system page routes for Vue-style projects", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "pagemap.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List routes in matching order, with conflicts and invalid files
    Routes,

    /// Resolve request paths against the route table
    Resolve {
        /// Request paths, e.g. /about/1b234bk12b3/more
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the route manifest as JSON
    Manifest {
        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Watch page directories and report route changes
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Routes => commands::routes::execute(&cli.config)?,
        Commands::Resolve { paths } => commands::resolve::execute(&cli.config, &paths)?,
        Commands::Manifest { pretty } => commands::manifest::execute(&cli.config, pretty)?,
        Commands::Watch => commands::watch::execute(&cli.config)?,
    }

    Ok(())
}
