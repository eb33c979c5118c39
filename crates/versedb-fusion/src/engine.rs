//! The fusion engine: concurrent stream fan-out, merge, budget selection.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use versedb_core::config::FusionSettings;
use versedb_core::error::{Error, Result};
use versedb_core::types::{Chunk, ChunkId, RankedResult, SearchFilters, SearchHit};
use versedb_index::MasterIndex;
use versedb_vector::SimilaritySearch;

use crate::merge::{merge_streams, select_within_budget};

/// The outcome of one fused query. An empty result list is a valid outcome,
/// not an error; suggestions then carry the themes and documents the query
/// brushed against, for a "no relevant information" response downstream.
#[derive(Debug, Clone, Default)]
pub struct FusionOutcome {
    pub results: Vec<RankedResult>,
    pub suggested_themes: Vec<String>,
    pub suggested_documents: Vec<String>,
}

impl FusionOutcome {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Merges the similarity, master-index and theme streams per query.
/// Stateless across calls; all tuning lives in [`FusionSettings`].
pub struct FusionEngine {
    similarity: Arc<SimilaritySearch>,
    index: Arc<MasterIndex>,
    settings: FusionSettings,
}

impl FusionEngine {
    pub fn new(
        similarity: Arc<SimilaritySearch>,
        index: Arc<MasterIndex>,
        settings: FusionSettings,
    ) -> Self {
        Self {
            similarity,
            index,
            settings,
        }
    }

    /// Run the three retrieval streams concurrently, fuse, and select under
    /// the token budget.
    ///
    /// A failed stream degrades to empty with a `warn`; the query aborts only
    /// when all three streams fail.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<FusionOutcome> {
        let (vector, terms, themes) = tokio::join!(
            self.similarity.search(query, limit, filters),
            self.index.term_hits(query, limit),
            self.index.theme_hits(query, limit),
        );

        let mut failed = 0u8;
        let vector = recover(vector, "vector", &mut failed);
        let terms = recover(terms, "master-index", &mut failed);
        let themes = recover(themes, "theme", &mut failed);
        if failed == 3 {
            return Err(Error::Provider(
                "all retrieval streams failed".to_string(),
            ));
        }
        debug!(
            vector = vector.len(),
            terms = terms.len(),
            themes = themes.len(),
            "retrieval streams returned"
        );

        let candidates = merge_streams(vector, terms, themes, &self.settings);
        if candidates.is_empty() {
            return self.empty_outcome(query).await;
        }

        let ids: Vec<ChunkId> = candidates.iter().map(|c| c.id.clone()).collect();
        let mut by_id: HashMap<ChunkId, Chunk> = self
            .index
            .chunks_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let results = select_within_budget(candidates, &mut by_id, &self.settings);
        if results.is_empty() {
            return self.empty_outcome(query).await;
        }
        Ok(FusionOutcome {
            results,
            suggested_themes: Vec::new(),
            suggested_documents: Vec::new(),
        })
    }

    async fn empty_outcome(&self, query: &str) -> Result<FusionOutcome> {
        let (suggested_themes, suggested_documents) = self.index.detect(query).await?;
        Ok(FusionOutcome {
            results: Vec::new(),
            suggested_themes,
            suggested_documents,
        })
    }
}

fn recover(result: Result<Vec<SearchHit>>, stream: &str, failed: &mut u8) -> Vec<SearchHit> {
    match result {
        Ok(hits) => hits,
        Err(err) => {
            *failed += 1;
            warn!(stream, error = %err, "retrieval stream degraded to empty");
            Vec::new()
        }
    }
}
