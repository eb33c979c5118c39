//! In-memory reference implementation of [`VectorStore`].

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use versedb_core::error::Result;
use versedb_core::traits::VectorStore;
use versedb_core::types::{ChunkId, EmbeddingRecord, Provenance, SearchFilters, SearchHit};

#[derive(Default)]
pub struct MemoryVectorStore {
    records: RwLock<HashMap<ChunkId, EmbeddingRecord>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity with a zero-norm guard.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn passes(record: &EmbeddingRecord, filters: &SearchFilters) -> bool {
    if !filters.documents.is_empty() && !filters.documents.contains(&record.document) {
        return false;
    }
    if !filters.themes.is_empty()
        && !record.themes.iter().any(|t| filters.themes.contains(t))
    {
        return false;
    }
    true
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, records: Vec<EmbeddingRecord>) -> Result<()> {
        let mut guard = self.records.write().await;
        for record in records {
            // Keyed replace: a chunk re-stored with new content arrives with a
            // fresh vector, so no stale embedding survives.
            guard.insert(record.chunk_id.clone(), record);
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>> {
        let guard = self.records.read().await;
        let mut hits: Vec<SearchHit> = guard
            .values()
            .filter(|r| passes(r, filters))
            .map(|r| SearchHit {
                id: r.chunk_id.clone(),
                score: cosine_similarity(query, &r.vector),
                source: Provenance::Vector,
            })
            .filter(|h| filters.min_score.is_none_or(|min| h.score >= min))
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}
