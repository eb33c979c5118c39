//! Seams between the retrieval core and its collaborators.
//!
//! Stores are async because production backends sit behind I/O; the reference
//! in-memory implementations live next to their consumers and back the tests
//! and the CLI.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Chunk, ChunkId, Document, EmbeddingRecord, IndexEntry, IndexType, SearchFilters, SearchHit,
};

/// Converts text to a fixed-length vector. External collaborator; failures
/// surface as [`crate::Error::Provider`] after any retry policy is exhausted.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `hash:d256`).
    fn id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    /// Compute the embedding for one input text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Storage for documents and their chunks.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store a document together with its full chunk set, all-or-nothing.
    /// Re-storing an existing document replaces its chunks (idempotent upsert
    /// keyed on chunk id; references and content are produced upstream and
    /// arrive already stable).
    async fn put_document(&self, document: Document, chunks: Vec<Chunk>) -> Result<()>;

    /// Batch chunk retrieval. Unknown ids are silently skipped; index entries
    /// hold weak references that may outlive their chunks.
    async fn chunks_by_ids(&self, ids: &[ChunkId]) -> Result<Vec<Chunk>>;

    /// Every chunk currently stored, in an unspecified but stable order.
    async fn all_chunks(&self) -> Result<Vec<Chunk>>;

    async fn document(&self, name: &str) -> Result<Option<Document>>;

    async fn documents(&self) -> Result<Vec<Document>>;

    /// Delete a document and cascade to its chunks. Returns deleted chunk count.
    async fn remove_document(&self, name: &str) -> Result<usize>;
}

/// Storage for the master index.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Atomically replace the whole index table. Readers observe either the
    /// previous complete index or the new one, never a partial state.
    async fn replace_all(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Partial term match with optional type filter, ranked by importance
    /// then frequency.
    async fn search_terms(
        &self,
        fragment: &str,
        index_type: Option<IndexType>,
        limit: usize,
    ) -> Result<Vec<IndexEntry>>;

    /// Document-name substring routing; a coarse signal, scored low upstream.
    async fn search_documents(&self, fragment: &str, limit: usize) -> Result<Vec<IndexEntry>>;

    /// Full entry table snapshot (for diagnostics and rebuild verification).
    async fn entries(&self) -> Result<Vec<IndexEntry>>;
}

/// Storage and nearest-neighbor lookup for chunk embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace embeddings keyed by chunk id. Re-storing a chunk with
    /// new content must carry a freshly generated vector; the store never keeps
    /// a stale vector for changed text.
    async fn upsert(&self, records: Vec<EmbeddingRecord>) -> Result<()>;

    /// Return the `limit` nearest chunks by cosine similarity, subject to
    /// `filters`, highest score first.
    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>>;

    async fn len(&self) -> Result<usize>;
}
