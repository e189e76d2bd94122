//! Durable per-chunk snapshots, written as chunks are produced.
//!
//! This is the write side of dashboarding: ingestion records every
//! enriched chunk here and must never fail because of it: callers log
//! and swallow errors from `record`.

use anyhow::Result;
use quarry_core::models::{Chunk, CollectionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub ts: u64,
    pub repo: String,
    pub file: String,
    pub complexity: u32,
    pub anti_patterns: Vec<String>,
    pub authors: Vec<String>,
}

impl SnapshotRecord {
    pub fn from_chunk(collection: &CollectionId, chunk: &Chunk) -> Self {
        Self {
            ts: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            repo: collection.as_str().to_string(),
            file: chunk.file_path.clone(),
            complexity: chunk.complexity,
            anti_patterns: chunk.anti_patterns.clone(),
            authors: chunk.authors.iter().cloned().collect(),
        }
    }
}

/// Roll-up over one repository's snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoSummary {
    pub chunks: u64,
    pub avg_complexity: f64,
}

pub struct SnapshotStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path)?;
        let tree = db.open_tree("snapshots")?;
        Ok(Self { db, tree })
    }

    pub fn record(&self, record: &SnapshotRecord) -> Result<()> {
        let key = self.db.generate_id()?.to_be_bytes();
        let bytes = bincode::serialize(record)?;
        self.tree.insert(key, bytes)?;
        Ok(())
    }

    /// All records for one repository, in insertion order.
    pub fn records(&self, repo: &str) -> Result<Vec<SnapshotRecord>> {
        let mut records = Vec::new();
        for item in self.tree.iter() {
            let (_, value) = item?;
            let record: SnapshotRecord = bincode::deserialize(&value)?;
            if record.repo == repo {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn summary(&self, repo: &str) -> Result<RepoSummary> {
        let mut chunks = 0u64;
        let mut total_complexity = 0u64;
        for item in self.tree.iter() {
            let (_, value) = item?;
            let record: SnapshotRecord = bincode::deserialize(&value)?;
            if record.repo == repo {
                chunks += 1;
                total_complexity += u64::from(record.complexity);
            }
        }
        let avg_complexity = if chunks > 0 {
            total_complexity as f64 / chunks as f64
        } else {
            0.0
        };
        Ok(RepoSummary {
            chunks,
            avg_complexity,
        })
    }

    /// Contributors ranked by how many recorded chunks carry them.
    pub fn author_breakdown(&self, repo: &str) -> Result<Vec<(String, u64)>> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for item in self.tree.iter() {
            let (_, value) = item?;
            let record: SnapshotRecord = bincode::deserialize(&value)?;
            if record.repo == repo {
                for author in record.authors {
                    *counts.entry(author).or_default() += 1;
                }
            }
        }
        let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(ranked)
    }
}
