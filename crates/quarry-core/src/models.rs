use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

/// Number of hex characters kept from the path hash.
const COLLECTION_ID_LEN: usize = 20;

/// Stable identifier for one indexed repository.
///
/// Derived from the repository path *string as given*: identity is
/// string identity, so the same path always maps to the same collection
/// and a re-index replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn for_repo(repo_path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(repo_path.to_string_lossy().as_bytes());
        let digest = hex::encode(hasher.finalize());
        CollectionId(digest[..COLLECTION_ID_LEN].to_string())
    }

    /// Wrap an identifier that was produced by `for_repo` earlier
    /// (e.g. read back from the CLI's active-collection file).
    pub fn from_raw(id: impl Into<String>) -> Self {
        CollectionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bounded span of source text, annotated during ingestion.
/// Immutable once enriched; many chunks reference one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    /// Repository-relative path of the originating file.
    pub file_path: String,
    /// Cyclomatic-complexity-like heuristic score.
    pub complexity: u32,
    /// Ordered anti-pattern finding labels.
    pub anti_patterns: Vec<String>,
    /// Distinct contributor identities from version control.
    pub authors: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Metadata JSON in the shape persisted alongside the vectors.
    /// The regex provenance filter matches against content + this.
    pub fn metadata_json(&self) -> String {
        serde_json::json!({
            "filePath": self.file_path,
            "complexity": self.complexity,
            "antiPatterns": self.anti_patterns,
            "authors": self.authors,
        })
        .to_string()
    }
}

/// One retrieval candidate with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub score: f32,
    pub chunk: Chunk,
}

/// The only output shape the model is allowed to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

impl StructuredAnswer {
    pub fn fallback(raw: impl Into<String>) -> Self {
        Self {
            answer: raw.into(),
            sources: Vec::new(),
        }
    }
}

/// What callers of the synchronous ask path receive.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerEnvelope {
    pub text: String,
    pub sources: Vec<String>,
    /// Derived mean similarity over attributed sources, in [0, 1],
    /// rounded to two decimals. Never supplied by the model.
    pub confidence: f32,
    pub source_documents: Vec<Chunk>,
}

/// Per-source metadata attached to the terminal streaming event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAttribution {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub complexity: u32,
    #[serde(rename = "antiPatterns")]
    pub anti_patterns: Vec<String>,
    pub authors: BTreeSet<String>,
    pub confidence: f32,
}

impl SourceAttribution {
    pub fn from_chunk(chunk: &Chunk, confidence: f32) -> Self {
        Self {
            file_path: chunk.file_path.clone(),
            complexity: chunk.complexity,
            anti_patterns: chunk.anti_patterns.clone(),
            authors: chunk.authors.clone(),
            confidence,
        }
    }
}

/// One element of the finite, ordered streaming sequence: any number of
/// token events followed by exactly one sources event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnswerEvent {
    Token { text: String },
    Sources { sources: Vec<SourceAttribution> },
}
