//! Nearest-neighbor retrieval over chunk embeddings.

use std::sync::Arc;

use tracing::debug;

use versedb_core::error::Result;
use versedb_core::traits::{EmbeddingProvider, VectorStore};
use versedb_core::types::{Chunk, EmbeddingRecord, SearchFilters, SearchHit};

/// The similarity-search engine: one embedding-provider call per query, then
/// a filtered cosine scan of the vector store.
pub struct SimilaritySearch {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl SimilaritySearch {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embed chunk contents in place and upsert the vectors.
    ///
    /// Re-processing a chunk whose content changed regenerates its embedding
    /// from the new content; the keyed upsert guarantees no stale vector
    /// survives. Returns the number of chunks embedded.
    pub async fn embed_chunks(&self, chunks: &mut [Chunk]) -> Result<usize> {
        let mut records = Vec::with_capacity(chunks.len());
        for chunk in chunks.iter_mut() {
            let vector = self.provider.embed(&chunk.content).await?;
            chunk.embedding = Some(vector.clone());
            records.push(EmbeddingRecord {
                chunk_id: chunk.id.clone(),
                document: chunk.document.clone(),
                themes: chunk.themes.clone(),
                vector,
            });
        }
        let count = records.len();
        self.store.upsert(records).await?;
        debug!(count, provider = self.provider.id(), "embedded chunks");
        Ok(count)
    }

    /// The `limit` chunks nearest to the query text, subject to filters.
    ///
    /// A provider failure propagates as [`versedb_core::Error::Provider`];
    /// the caller (fusion) degrades this stream alone, not the whole query.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>> {
        let query_vector = self.provider.embed(query).await?;
        self.store.search(&query_vector, limit, filters).await
    }
}
