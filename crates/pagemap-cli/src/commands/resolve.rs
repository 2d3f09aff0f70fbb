use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use pagemap_router::RouteError;

use super::{block_on, load_store};

pub fn execute(config_path: &Path, paths: &[String]) -> Result<()> {
    let (_, store) = block_on(load_store(config_path))??;
    let table = store.snapshot();

    for request in paths {
        match table.match_route(request) {
            Ok(result) => {
                println!(
                    "{} {} {}",
                    "✓".green(),
                    request.bold(),
                    result.entry.path.to_string().cyan()
                );
                println!("    file: {}", result.entry.component);
                for (name, value) in &result.params {
                    println!("    {} = {}", name.yellow(), value);
                }
                for layout in &result.layouts {
                    println!("    layout: {}", layout.component.dimmed());
                }
            }
            Err(RouteError::NoRouteMatched { path }) => {
                println!("{} {} {}", "✗".red(), path.bold(), "not found".red());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
