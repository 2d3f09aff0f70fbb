use std::path::Path;

use anyhow::{Context, Result};
use pagemap_router::RouteManifest;

use super::{block_on, load_store};

pub fn execute(config_path: &Path, pretty: bool) -> Result<()> {
    let (_, store) = block_on(load_store(config_path))??;

    let manifest = RouteManifest::from_table(&store.snapshot());
    let json = manifest
        .to_json(pretty)
        .context("Failed to serialize route manifest")?;

    println!("{}", json);
    Ok(())
}
