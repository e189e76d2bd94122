use crate::models::CollectionId;

/// Failure taxonomy for the index/ask paths.
///
/// Everything that can be degraded gracefully (missing authorship,
/// malformed model output, empty retrieval) is handled locally and never
/// shows up here; these variants are the failures callers must see.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No persisted index exists for this collection.
    #[error("no index found for collection {0}; run `quarry index` first")]
    NotIndexed(CollectionId),

    /// The embedding collaborator failed. Fatal to an ingestion run:
    /// a partial index is never published.
    #[error("embedding failed: {0}")]
    Embedding(anyhow::Error),

    /// The language model could not be reached or errored. Ask paths
    /// degrade to an apologetic envelope instead of surfacing this.
    #[error("model invocation failed: {0}")]
    ModelInvocation(anyhow::Error),

    /// Reading or writing the persisted index artifact failed.
    #[error("index storage error: {0}")]
    Index(anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
