use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use quarry_store::SnapshotStore;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{load_config, remember_collection};

pub async fn handle_index(path: PathBuf, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let embedder = quarry_context::select_embedder(&config.embedding)?;
    let snapshots = SnapshotStore::open(&config.core.snapshots_path())
        .context("opening snapshot store")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!("Indexing {}", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = quarry_pipeline::ingest(&path, &config, embedder, &snapshots).await?;
    spinner.finish_and_clear();

    remember_collection(&config, &report.collection_id)?;

    println!(
        "{} {} files, {} chunks into collection {}",
        style("Indexed").green().bold(),
        report.files,
        report.chunks,
        style(report.collection_id.as_str()).cyan()
    );
    Ok(())
}
