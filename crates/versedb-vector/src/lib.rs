//! Similarity search: embedding provider plumbing, an in-memory vector store,
//! and the nearest-neighbor query engine.

pub mod provider;
pub mod search;
pub mod store;

pub use provider::{HashEmbedder, RetryingProvider};
pub use search::SimilaritySearch;
pub use store::MemoryVectorStore;
