//! Persisted per-collection vector index on lance.
//!
//! One dataset per collection, replaced wholesale by each ingestion run.
//! Builds land in a temp directory and are published by rename, so a
//! reader can only ever observe the previous index or the new one.

use anyhow::anyhow;
use arrow::array::{
    ArrayRef, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use futures::stream::TryStreamExt;
use lance::dataset::{Dataset, WriteMode, WriteParams};
use quarry_core::models::{Chunk, CollectionId, ScoredChunk};
use quarry_core::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct VectorIndex {
    dataset: Dataset,
    num_rows: usize,
}

impl VectorIndex {
    /// Embeddings must all be present with exactly `dimension` floats;
    /// anything else is an embedding failure and nothing is published.
    pub async fn build(
        collections_dir: &Path,
        id: &CollectionId,
        chunks: &[Chunk],
        dimension: usize,
    ) -> Result<Self> {
        for chunk in chunks {
            match &chunk.embedding {
                Some(vector) if vector.len() == dimension => {}
                Some(vector) => {
                    return Err(Error::Embedding(anyhow!(
                        "chunk from {} embedded with {} dimensions, expected {}",
                        chunk.file_path,
                        vector.len(),
                        dimension
                    )));
                }
                None => {
                    return Err(Error::Embedding(anyhow!(
                        "chunk from {} has no embedding",
                        chunk.file_path
                    )));
                }
            }
        }

        std::fs::create_dir_all(collections_dir)
            .map_err(|e| Error::Index(anyhow!("creating {}: {e}", collections_dir.display())))?;

        let staging = collections_dir.join(format!("{id}.lance.tmp"));
        if staging.exists() {
            std::fs::remove_dir_all(&staging).map_err(|e| Error::Index(anyhow!(e)))?;
        }

        let schema = index_schema(dimension);
        let batch = build_batch(&schema, chunks, dimension).map_err(Error::Index)?;
        let reader = RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema);

        Dataset::write(
            reader,
            staging.to_str().ok_or_else(|| Error::Index(anyhow!("non-UTF8 index path")))?,
            Some(WriteParams {
                mode: WriteMode::Create,
                ..Default::default()
            }),
        )
        .await
        .map_err(|e| Error::Index(anyhow!(e)))?;

        // Publish: drop the old dataset, move the staged one into place.
        let published = dataset_path(collections_dir, id);
        if published.exists() {
            std::fs::remove_dir_all(&published).map_err(|e| Error::Index(anyhow!(e)))?;
        }
        std::fs::rename(&staging, &published).map_err(|e| Error::Index(anyhow!(e)))?;

        Self::open(&published).await
    }

    pub async fn load(collections_dir: &Path, id: &CollectionId) -> Result<Self> {
        let path = dataset_path(collections_dir, id);
        if !path.exists() {
            return Err(Error::NotIndexed(id.clone()));
        }
        Self::open(&path).await
    }

    async fn open(path: &Path) -> Result<Self> {
        let dataset = Dataset::open(
            path.to_str().ok_or_else(|| Error::Index(anyhow!("non-UTF8 index path")))?,
        )
        .await
        .map_err(|e| Error::Index(anyhow!(e)))?;
        let num_rows = dataset
            .count_rows(None)
            .await
            .map_err(|e| Error::Index(anyhow!(e)))?;
        Ok(Self { dataset, num_rows })
    }

    /// Chunks in this collection.
    pub fn len(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Nearest chunks for `query_vector`, ordered by descending
    /// similarity with ingestion order breaking ties.
    pub async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        if limit == 0 || self.num_rows == 0 {
            return Ok(Vec::new());
        }

        let query_array = Float32Array::from(query_vector.to_vec());
        let mut stream = self
            .dataset
            .scan()
            .nearest("embedding", &query_array, limit)
            .map_err(|e| Error::Index(anyhow!(e)))?
            .try_into_stream()
            .await
            .map_err(|e| Error::Index(anyhow!(e)))?;

        let mut hits: Vec<(f32, u64, Chunk)> = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| Error::Index(anyhow!(e)))?
        {
            collect_hits(&batch, &mut hits).map_err(Error::Index)?;
        }

        hits.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        hits.truncate(limit);

        Ok(hits
            .into_iter()
            .map(|(score, _, chunk)| ScoredChunk { score, chunk })
            .collect())
    }
}

fn dataset_path(collections_dir: &Path, id: &CollectionId) -> PathBuf {
    collections_dir.join(format!("{id}.lance"))
}

fn index_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("ord", DataType::UInt64, false),
        Field::new("file_path", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("complexity", DataType::UInt64, false),
        Field::new("anti_patterns", DataType::Utf8, false),
        Field::new("authors", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension as i32,
            ),
            false,
        ),
    ]))
}

fn build_batch(
    schema: &Arc<Schema>,
    chunks: &[Chunk],
    dimension: usize,
) -> anyhow::Result<RecordBatch> {
    let ords: Vec<u64> = (0..chunks.len() as u64).collect();
    let file_paths: Vec<String> = chunks.iter().map(|c| c.file_path.clone()).collect();
    let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let complexities: Vec<u64> = chunks.iter().map(|c| u64::from(c.complexity)).collect();
    let anti_patterns: Vec<String> = chunks
        .iter()
        .map(|c| serde_json::to_string(&c.anti_patterns))
        .collect::<serde_json::Result<_>>()?;
    let authors: Vec<String> = chunks
        .iter()
        .map(|c| serde_json::to_string(&c.authors))
        .collect::<serde_json::Result<_>>()?;
    let embeddings: Vec<f32> = chunks
        .iter()
        .flat_map(|c| c.embedding.as_deref().unwrap_or_default().to_vec())
        .collect();

    let embedding_array: ArrayRef = {
        let values = Float32Array::from(embeddings);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        Arc::new(arrow::array::FixedSizeListArray::new(
            field,
            dimension as i32,
            Arc::new(values),
            None,
        ))
    };

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(UInt64Array::from(ords)),
            Arc::new(StringArray::from(file_paths)),
            Arc::new(StringArray::from(contents)),
            Arc::new(UInt64Array::from(complexities)),
            Arc::new(StringArray::from(anti_patterns)),
            Arc::new(StringArray::from(authors)),
            embedding_array,
        ],
    )?;
    Ok(batch)
}

fn collect_hits(batch: &RecordBatch, hits: &mut Vec<(f32, u64, Chunk)>) -> anyhow::Result<()> {
    let ords = column::<UInt64Array>(batch, "ord")?;
    let file_paths = column::<StringArray>(batch, "file_path")?;
    let contents = column::<StringArray>(batch, "content")?;
    let complexities = column::<UInt64Array>(batch, "complexity")?;
    let anti_patterns = column::<StringArray>(batch, "anti_patterns")?;
    let authors = column::<StringArray>(batch, "authors")?;
    let distances = column::<Float32Array>(batch, "_distance")?;

    for i in 0..batch.num_rows() {
        let patterns: Vec<String> =
            serde_json::from_str(anti_patterns.value(i)).unwrap_or_default();
        let author_set: BTreeSet<String> =
            serde_json::from_str(authors.value(i)).unwrap_or_default();
        let chunk = Chunk {
            content: contents.value(i).to_string(),
            file_path: file_paths.value(i).to_string(),
            complexity: complexities.value(i) as u32,
            anti_patterns: patterns,
            authors: author_set,
            embedding: None,
        };

        let distance = distances.value(i);
        let similarity = 1.0 / (1.0 + distance);
        hits.push((similarity, ords.value(i), chunk));
    }
    Ok(())
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing {name} column"))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("failed to cast {name} column"))
}
