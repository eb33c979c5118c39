//! In-memory reference implementation of [`IndexStore`].
//!
//! Production persistence is an external collaborator; this store backs the
//! tests and the CLI. Replace-all swaps an `Arc` snapshot under a write lock,
//! so concurrent readers always observe a complete index.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use versedb_core::error::Result;
use versedb_core::traits::IndexStore;
use versedb_core::types::{IndexEntry, IndexType};

#[derive(Default)]
pub struct MemoryIndexStore {
    entries: RwLock<Arc<Vec<IndexEntry>>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn snapshot(&self) -> Arc<Vec<IndexEntry>> {
        self.entries.read().await.clone()
    }
}

fn rank(entries: &mut [IndexEntry]) {
    entries.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.frequency.cmp(&a.frequency))
            .then_with(|| a.term.cmp(&b.term))
    });
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn replace_all(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let fresh = Arc::new(entries);
        let mut guard = self.entries.write().await;
        *guard = fresh;
        Ok(())
    }

    async fn search_terms(
        &self,
        fragment: &str,
        index_type: Option<IndexType>,
        limit: usize,
    ) -> Result<Vec<IndexEntry>> {
        let fragment = fragment.to_lowercase();
        let snapshot = self.snapshot().await;
        let mut matches: Vec<IndexEntry> = snapshot
            .iter()
            .filter(|e| index_type.is_none_or(|t| e.index_type == t))
            .filter(|e| {
                e.term.contains(&fragment)
                    || e.secondary_term
                        .as_ref()
                        .is_some_and(|s| s.to_lowercase().contains(&fragment))
            })
            .cloned()
            .collect();
        rank(&mut matches);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn search_documents(&self, fragment: &str, limit: usize) -> Result<Vec<IndexEntry>> {
        let fragment = fragment.to_lowercase();
        let snapshot = self.snapshot().await;
        let mut matches: Vec<IndexEntry> = snapshot
            .iter()
            .filter(|e| e.index_type == IndexType::BookAlias)
            .filter(|e| {
                e.term.contains(&fragment)
                    || e.documents.iter().any(|d| d.to_lowercase().contains(&fragment))
            })
            .cloned()
            .collect();
        rank(&mut matches);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn entries(&self) -> Result<Vec<IndexEntry>> {
        Ok(self.snapshot().await.as_ref().clone())
    }
}
