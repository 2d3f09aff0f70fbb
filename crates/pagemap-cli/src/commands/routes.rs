use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use pagemap_router::{ImportMode, RouteTable};

use super::{block_on, load_store};

pub fn execute(config_path: &Path) -> Result<()> {
    let (_, store) = block_on(load_store(config_path))??;
    print_table(&store.snapshot());
    Ok(())
}

pub fn print_table(table: &RouteTable) {
    println!("{}", format!("Routes ({})", table.len()).green().bold());
    println!();

    let width = table
        .routes()
        .iter()
        .map(|entry| entry.path.to_string().len())
        .max()
        .unwrap_or(0);

    for entry in table.routes() {
        let mode = match entry.import_mode {
            ImportMode::Sync => " sync".dimmed().to_string(),
            ImportMode::Async => String::new(),
        };
        let pattern = format!("{:<width$}", entry.path.to_string(), width = width);
        println!("  {}  {}{}", pattern.cyan(), entry.component, mode);
    }

    if !table.conflicts().is_empty() {
        println!();
        println!("{}", "Conflicts".yellow().bold());
        for conflict in table.conflicts() {
            println!("  {} {}", "⚠".yellow(), conflict);
        }
    }

    let invalid: Vec<_> = table.invalid().collect();
    if !invalid.is_empty() {
        println!();
        println!("{}", "Invalid files".red().bold());
        for error in invalid {
            println!("  {} {}", "✗".red(), error);
        }
    }
}
