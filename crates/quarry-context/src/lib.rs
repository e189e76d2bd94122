pub mod embedder;
pub mod llm;
pub mod mock;

pub use embedder::select_embedder;
pub use llm::select_llm;
