//! Query surface of the master index.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::info;

use versedb_core::config::IndexCacheSettings;
use versedb_core::error::Result;
use versedb_core::traits::{ChunkStore, IndexStore};
use versedb_core::types::{Chunk, ChunkId, IndexEntry, IndexType, Provenance, SearchHit};

use crate::builder::build_entries;
use crate::cache::HotEntryCache;

/// Score attached to chunks found only by document-name routing: a coarse
/// signal, deliberately below any real relevance score.
const BOOK_ROUTING_SCORE: f32 = 0.3;

#[derive(Debug, Clone, Copy, Default)]
pub struct RebuildStats {
    pub entries: usize,
    pub themes: usize,
    pub keywords: usize,
    pub books: usize,
}

/// The master index engine: rebuild plus term/theme/book lookups over an
/// [`IndexStore`], with chunk materialization through the [`ChunkStore`].
pub struct MasterIndex {
    store: Arc<dyn IndexStore>,
    chunks: Arc<dyn ChunkStore>,
    cache: HotEntryCache,
}

impl MasterIndex {
    pub fn new(
        store: Arc<dyn IndexStore>,
        chunks: Arc<dyn ChunkStore>,
        cache_settings: &IndexCacheSettings,
    ) -> Self {
        Self::with_cache(store, chunks, HotEntryCache::new(cache_settings))
    }

    pub fn with_cache(
        store: Arc<dyn IndexStore>,
        chunks: Arc<dyn ChunkStore>,
        cache: HotEntryCache,
    ) -> Self {
        Self {
            store,
            chunks,
            cache,
        }
    }

    /// Rebuild the whole index from the current chunk set.
    ///
    /// The replacement table is computed in full before the store swap, so a
    /// failure mid-build leaves the previous complete index visible; retrying
    /// the whole rebuild is always safe because entries are purely derived.
    pub async fn rebuild(&self) -> Result<RebuildStats> {
        let chunks = self.chunks.all_chunks().await?;
        let titles: HashMap<String, String> = self
            .chunks
            .documents()
            .await?
            .into_iter()
            .map(|d| (d.name, d.title))
            .collect();

        let entries = build_entries(&chunks, &titles);
        let stats = RebuildStats {
            entries: entries.len(),
            themes: count_type(&entries, IndexType::Theme),
            keywords: count_type(&entries, IndexType::Keyword),
            books: count_type(&entries, IndexType::BookAlias),
        };
        self.store.replace_all(entries).await?;
        self.cache.clear();
        info!(
            entries = stats.entries,
            themes = stats.themes,
            keywords = stats.keywords,
            books = stats.books,
            "master index rebuilt"
        );
        Ok(stats)
    }

    /// Partial term lookup, ranked by importance then frequency. Served from
    /// the hot-entry cache when it is fresh and already yields enough matches;
    /// a stale or empty cache is refreshed from the store, never served.
    pub async fn search_terms(
        &self,
        fragment: &str,
        index_type: Option<IndexType>,
        limit: usize,
    ) -> Result<Vec<IndexEntry>> {
        if let Some(cached) = self.cache.get() {
            let fragment_lower = fragment.to_lowercase();
            let hits: Vec<IndexEntry> = cached
                .into_iter()
                .filter(|e| index_type.is_none_or(|t| e.index_type == t))
                .filter(|e| e.term.contains(&fragment_lower))
                .take(limit)
                .collect();
            if hits.len() >= limit {
                return Ok(hits);
            }
        } else {
            let all = self.store.entries().await?;
            self.cache.fill(all);
        }
        self.store.search_terms(fragment, index_type, limit).await
    }

    pub async fn search_documents(&self, fragment: &str, limit: usize) -> Result<Vec<IndexEntry>> {
        self.store.search_documents(fragment, limit).await
    }

    /// Batch chunk materialization for ids discovered via term lookup. Stale
    /// ids (chunks deleted since the last rebuild) are skipped by the store.
    pub async fn chunks_by_ids(&self, ids: &[ChunkId]) -> Result<Vec<Chunk>> {
        self.chunks.chunks_by_ids(ids).await
    }

    /// Keyword and book-alias routing stream for result fusion.
    pub async fn term_hits(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let mut scored: BTreeMap<ChunkId, f32> = BTreeMap::new();
        for term in query_terms(query) {
            for entry in self
                .search_terms(&term, Some(IndexType::Keyword), limit)
                .await?
            {
                for id in &entry.chunk_ids {
                    merge_max(&mut scored, id, entry.importance);
                }
            }
            for entry in self.search_documents(&term, limit).await? {
                for id in &entry.chunk_ids {
                    merge_max(&mut scored, id, BOOK_ROUTING_SCORE);
                }
            }
        }
        Ok(to_hits(scored, Provenance::MasterIndex, limit))
    }

    /// Theme routing stream for result fusion.
    pub async fn theme_hits(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let mut scored: BTreeMap<ChunkId, f32> = BTreeMap::new();
        for term in query_terms(query) {
            for entry in self
                .search_terms(&term, Some(IndexType::Theme), limit)
                .await?
            {
                for id in &entry.chunk_ids {
                    merge_max(&mut scored, id, entry.importance);
                }
            }
        }
        Ok(to_hits(scored, Provenance::Theme, limit))
    }

    /// Theme and document names matched by the query; used for "no results"
    /// suggestions.
    pub async fn detect(&self, query: &str) -> Result<(Vec<String>, Vec<String>)> {
        let mut themes = BTreeSet::new();
        let mut documents = BTreeSet::new();
        for term in query_terms(query) {
            for entry in self
                .search_terms(&term, Some(IndexType::Theme), 5)
                .await?
            {
                themes.insert(entry.term);
            }
            for entry in self.search_documents(&term, 5).await? {
                documents.extend(entry.documents);
            }
        }
        Ok((themes.into_iter().collect(), documents.into_iter().collect()))
    }
}

fn count_type(entries: &[IndexEntry], t: IndexType) -> usize {
    entries.iter().filter(|e| e.index_type == t).count()
}

fn merge_max(scored: &mut BTreeMap<ChunkId, f32>, id: &str, score: f32) {
    let slot = scored.entry(id.to_string()).or_insert(score);
    if score > *slot {
        *slot = score;
    }
}

fn to_hits(scored: BTreeMap<ChunkId, f32>, source: Provenance, limit: usize) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = scored
        .into_iter()
        .map(|(id, score)| SearchHit { id, score, source })
        .collect();
    // Score descending; the id tie-break keeps output reproducible.
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(limit);
    hits
}

/// Lowercased query words worth routing on (three or more characters).
fn query_terms(query: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_terms_dedup_and_filter() {
        let terms = query_terms("What is karma? Karma and a vow");
        assert_eq!(terms, vec!["what", "karma", "and", "vow"]);
    }
}
