use anyhow::{Context, Result};
use console::style;
use quarry_store::SnapshotStore;
use std::path::Path;

use super::{load_config, resolve_collection};

pub fn handle_status(collection: Option<String>, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let collection = resolve_collection(&config, collection)?;
    let snapshots = SnapshotStore::open(&config.core.snapshots_path())
        .context("opening snapshot store")?;

    let summary = snapshots.summary(collection.as_str())?;
    println!("{} {}", style("collection").dim(), collection);
    println!("{} {}", style("chunks").dim(), summary.chunks);
    println!(
        "{} {:.2}",
        style("avg complexity").dim(),
        summary.avg_complexity
    );

    let breakdown = snapshots.author_breakdown(collection.as_str())?;
    if !breakdown.is_empty() {
        println!("{}", style("authors").dim());
        for (author, chunks) in breakdown.iter().take(10) {
            println!("  {author}: {chunks}");
        }
    }
    Ok(())
}
