//! Full ingestion run: scan, window, enrich, record, embed, publish.
//!
//! A run either publishes a complete index for the repository's
//! collection or leaves the previous one untouched. Enrichment
//! side effects (snapshot recording, authorship lookups) are
//! best-effort and never fail the run; embedding failures are fatal.

use anyhow::anyhow;
use futures::stream::{self, StreamExt};
use quarry_config::Config;
use quarry_core::models::{Chunk, CollectionId};
use quarry_core::traits::Embedder;
use quarry_core::{analysis, authorship, chunking::WindowChunker, scanner, Error, Result};
use quarry_index::VectorIndex;
use quarry_store::{SnapshotRecord, SnapshotStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const PREPARE_CONCURRENCY: usize = 8;
const EMBED_BATCH_SIZE: usize = 512;

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub collection_id: CollectionId,
    pub files: usize,
    pub chunks: usize,
}

/// Index the repository at `repo_path`, replacing any previous index
/// for the same path. Returns the collection identifier; the same path
/// always yields the same one.
pub async fn ingest(
    repo_path: &Path,
    config: &Config,
    embedder: Arc<dyn Embedder>,
    snapshots: &SnapshotStore,
) -> Result<IngestReport> {
    let collection_id = CollectionId::for_repo(repo_path);
    let files = scanner::scan_repo(repo_path, &config.core);
    info!(
        collection = %collection_id,
        files = files.len(),
        "ingesting {}",
        repo_path.display()
    );

    let file_count = files.len();
    let repo_root = repo_path.to_path_buf();
    let chunking = config.chunking.clone();

    // CPU-bound preparation fans out on the blocking pool; `buffered`
    // keeps scan order, which is what makes ingestion order stable.
    let mut prepared = stream::iter(files.into_iter().map(|file| {
        let repo_root = repo_root.clone();
        let chunking = chunking.clone();
        async move {
            tokio::task::spawn_blocking(move || prepare_file(&repo_root, &file, &chunking))
                .await
                .ok()
                .flatten()
        }
    }))
    .buffered(PREPARE_CONCURRENCY.max(1));

    let mut chunks: Vec<Chunk> = Vec::new();
    while let Some(file_chunks) = prepared.next().await {
        let Some(file_chunks) = file_chunks else {
            continue;
        };
        for chunk in file_chunks {
            // Recording must never block or fail the run.
            if let Err(err) = snapshots.record(&SnapshotRecord::from_chunk(&collection_id, &chunk))
            {
                warn!(file = %chunk.file_path, "snapshot recording failed: {err}");
            }
            chunks.push(chunk);
        }
    }

    embed_chunks(&mut chunks, embedder.as_ref()).await?;

    VectorIndex::build(
        &config.core.collections_dir(),
        &collection_id,
        &chunks,
        config.embedding.dimension,
    )
    .await?;

    info!(
        collection = %collection_id,
        chunks = chunks.len(),
        "index published"
    );
    Ok(IngestReport {
        collection_id,
        files: file_count,
        chunks: chunks.len(),
    })
}

fn prepare_file(
    repo_root: &Path,
    file: &scanner::ScannedFile,
    chunking: &quarry_config::ChunkingConfig,
) -> Option<Vec<Chunk>> {
    let content = match std::fs::read_to_string(&file.path) {
        Ok(content) => content,
        Err(err) => {
            warn!(file = %file.path.display(), "skipping unreadable file: {err}");
            return None;
        }
    };

    let chunker = match WindowChunker::new(chunking) {
        Ok(chunker) => chunker,
        Err(err) => {
            warn!("invalid chunking configuration: {err}");
            return None;
        }
    };

    // One authorship lookup per file, shared by all of its windows.
    let authors = authorship::authors_of(repo_root, Path::new(&file.relative_path));

    let chunks = chunker
        .split(&content)
        .into_iter()
        .map(|window| {
            let findings = analysis::analyze(&window);
            Chunk {
                content: window,
                file_path: file.relative_path.clone(),
                complexity: findings.complexity,
                anti_patterns: findings.anti_patterns,
                authors: authors.clone(),
                embedding: None,
            }
        })
        .collect();
    Some(chunks)
}

async fn embed_chunks(chunks: &mut [Chunk], embedder: &dyn Embedder) -> Result<()> {
    for batch in chunks.chunks_mut(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .map_err(Error::Embedding)?;
        if embeddings.len() != batch.len() {
            return Err(Error::Embedding(anyhow!(
                "embedding count mismatch: got {}, expected {}",
                embeddings.len(),
                batch.len()
            )));
        }
        for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
            chunk.embedding = Some(embedding);
        }
    }
    Ok(())
}
