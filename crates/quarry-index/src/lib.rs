pub mod retriever;
pub mod vector;

pub use retriever::{Retriever, SearchIndex, SimilaritySearch};
pub use vector::VectorIndex;
