//! In-memory reference implementation of [`ChunkStore`].
//!
//! Real persistence is an external collaborator; this store backs tests and
//! the CLI. A single write lock per operation makes `put_document`
//! all-or-nothing per document, and `remove_document` cascades to chunks.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::ChunkStore;
use crate::types::{Chunk, ChunkId, Document};

#[derive(Default)]
struct Inner {
    documents: BTreeMap<String, Document>,
    chunks: BTreeMap<ChunkId, Chunk>,
}

#[derive(Default)]
pub struct MemoryChunkStore {
    inner: RwLock<Inner>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn put_document(&self, document: Document, chunks: Vec<Chunk>) -> Result<()> {
        let mut inner = self.inner.write().await;
        // Replacing an existing document drops its old chunk set first so a
        // re-ingest cannot leave orphans behind.
        let stale: Vec<ChunkId> = inner
            .chunks
            .values()
            .filter(|c| c.document == document.name)
            .map(|c| c.id.clone())
            .collect();
        for id in stale {
            inner.chunks.remove(&id);
        }
        for chunk in chunks {
            inner.chunks.insert(chunk.id.clone(), chunk);
        }
        inner.documents.insert(document.name.clone(), document);
        Ok(())
    }

    async fn chunks_by_ids(&self, ids: &[ChunkId]) -> Result<Vec<Chunk>> {
        let inner = self.inner.read().await;
        // Unknown ids are skipped: index entries hold weak references.
        Ok(ids
            .iter()
            .filter_map(|id| inner.chunks.get(id).cloned())
            .collect())
    }

    async fn all_chunks(&self) -> Result<Vec<Chunk>> {
        let inner = self.inner.read().await;
        let mut chunks: Vec<Chunk> = inner.chunks.values().cloned().collect();
        chunks.sort_by(|a, b| a.document.cmp(&b.document).then(a.position.cmp(&b.position)));
        Ok(chunks)
    }

    async fn document(&self, name: &str) -> Result<Option<Document>> {
        let inner = self.inner.read().await;
        Ok(inner.documents.get(name).cloned())
    }

    async fn documents(&self) -> Result<Vec<Document>> {
        let inner = self.inner.read().await;
        Ok(inner.documents.values().cloned().collect())
    }

    async fn remove_document(&self, name: &str) -> Result<usize> {
        let mut inner = self.inner.write().await;
        inner.documents.remove(name);
        let doomed: Vec<ChunkId> = inner
            .chunks
            .values()
            .filter(|c| c.document == name)
            .map(|c| c.id.clone())
            .collect();
        let count = doomed.len();
        for id in doomed {
            inner.chunks.remove(&id);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Meta;

    fn chunk(doc: &str, position: usize) -> Chunk {
        Chunk {
            id: format!("{doc}:{position}"),
            document: doc.to_string(),
            position,
            content: "text".to_string(),
            secondary_content: None,
            exact_reference: format!("{doc}:sec1:{position}"),
            token_count: 1,
            summary: String::new(),
            themes: vec![],
            keywords: vec![],
            embedding: None,
            complete_section: true,
            metadata: Meta::new(),
        }
    }

    fn document(name: &str, total: usize) -> Document {
        Document {
            name: name.to_string(),
            title: name.to_string(),
            category: "/test".to_string(),
            languages: vec!["en".to_string()],
            total_chunks: total,
            metadata: Meta::new(),
        }
    }

    #[tokio::test]
    async fn removal_cascades_to_chunks() {
        let store = MemoryChunkStore::new();
        store
            .put_document(document("gita", 2), vec![chunk("gita", 0), chunk("gita", 1)])
            .await
            .unwrap();
        store
            .put_document(document("psalms", 1), vec![chunk("psalms", 0)])
            .await
            .unwrap();

        let removed = store.remove_document("gita").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.all_chunks().await.unwrap().len(), 1);
        assert!(store.document("gita").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_ids_are_skipped_in_batch_get() {
        let store = MemoryChunkStore::new();
        store
            .put_document(document("gita", 1), vec![chunk("gita", 0)])
            .await
            .unwrap();
        let found = store
            .chunks_by_ids(&["gita:0".to_string(), "gone:9".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn reingest_replaces_previous_chunk_set() {
        let store = MemoryChunkStore::new();
        store
            .put_document(document("gita", 3), vec![chunk("gita", 0), chunk("gita", 1), chunk("gita", 2)])
            .await
            .unwrap();
        store
            .put_document(document("gita", 1), vec![chunk("gita", 0)])
            .await
            .unwrap();
        assert_eq!(store.all_chunks().await.unwrap().len(), 1);
    }
}
