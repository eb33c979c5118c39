use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use versedb_core::config::{FusionSettings, IndexCacheSettings};
use versedb_core::error::{Error, Result};
use versedb_core::store::MemoryChunkStore;
use versedb_core::traits::{ChunkStore, EmbeddingProvider, IndexStore, VectorStore};
use versedb_core::types::{
    Chunk, Document, EmbeddingRecord, IndexEntry, IndexType, Provenance, SearchFilters, SearchHit,
};
use versedb_fusion::FusionEngine;
use versedb_index::{MasterIndex, MemoryIndexStore};
use versedb_vector::{HashEmbedder, SimilaritySearch};

fn chunk(id: &str, position: usize, tokens: usize, themes: &[&str]) -> Chunk {
    Chunk {
        id: id.to_string(),
        document: "verses".to_string(),
        position,
        content: "x".repeat(tokens * 4),
        secondary_content: None,
        exact_reference: format!("verses:body:{}", position + 1),
        token_count: tokens,
        summary: String::new(),
        themes: themes.iter().map(|t| (*t).to_string()).collect(),
        keywords: Vec::new(),
        embedding: None,
        complete_section: true,
        metadata: HashMap::new(),
    }
}

fn document(total_chunks: usize) -> Document {
    Document {
        name: "verses".to_string(),
        title: "Collected Verses".to_string(),
        category: "/scripture".to_string(),
        languages: vec!["en".to_string()],
        total_chunks,
        metadata: HashMap::new(),
    }
}

fn hit(id: &str, score: f32) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        score,
        source: Provenance::Vector,
    }
}

/// Vector store returning a fixed hit list, for exact-score scenarios.
struct ScriptedVectors {
    hits: Vec<SearchHit>,
}

#[async_trait]
impl VectorStore for ScriptedVectors {
    async fn upsert(&self, _records: Vec<EmbeddingRecord>) -> Result<()> {
        Ok(())
    }

    async fn search(
        &self,
        _query: &[f32],
        limit: usize,
        _filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>> {
        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.hits.len())
    }
}

struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn id(&self) -> &str {
        "failing"
    }

    fn dim(&self) -> usize {
        2
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::Provider("provider offline".to_string()))
    }
}

struct FailingIndexStore;

#[async_trait]
impl IndexStore for FailingIndexStore {
    async fn replace_all(&self, _entries: Vec<IndexEntry>) -> Result<()> {
        Err(Error::Storage("index store down".to_string()))
    }

    async fn search_terms(
        &self,
        _fragment: &str,
        _index_type: Option<IndexType>,
        _limit: usize,
    ) -> Result<Vec<IndexEntry>> {
        Err(Error::Storage("index store down".to_string()))
    }

    async fn search_documents(&self, _fragment: &str, _limit: usize) -> Result<Vec<IndexEntry>> {
        Err(Error::Storage("index store down".to_string()))
    }

    async fn entries(&self) -> Result<Vec<IndexEntry>> {
        Err(Error::Storage("index store down".to_string()))
    }
}

/// Corpus: chunk A (200 tokens, no themes) and chunk B (150 tokens, themed
/// "karma"), indexed and wired to a scripted vector stream.
async fn seeded_engine(
    settings: FusionSettings,
    vector_hits: Vec<SearchHit>,
) -> (FusionEngine, Arc<MemoryChunkStore>, Arc<MasterIndex>) {
    let chunks = Arc::new(MemoryChunkStore::new());
    chunks
        .put_document(
            document(2),
            vec![
                chunk("verses:0", 0, 200, &[]),
                chunk("verses:1", 1, 150, &["karma"]),
            ],
        )
        .await
        .unwrap();

    let index = Arc::new(MasterIndex::new(
        Arc::new(MemoryIndexStore::new()),
        chunks.clone(),
        &IndexCacheSettings::default(),
    ));
    index.rebuild().await.unwrap();

    let similarity = Arc::new(SimilaritySearch::new(
        Arc::new(HashEmbedder::default()),
        Arc::new(ScriptedVectors { hits: vector_hits }),
    ));
    let engine = FusionEngine::new(similarity, index.clone(), settings);
    (engine, chunks, index)
}

#[tokio::test]
async fn theme_boost_fuses_and_orders() {
    let settings = FusionSettings {
        token_budget: 400,
        ..FusionSettings::default()
    };
    let (engine, _, _) =
        seeded_engine(settings, vec![hit("verses:0", 0.9), hit("verses:1", 0.6)]).await;

    let outcome = engine
        .search("karma", 10, &SearchFilters::default())
        .await
        .unwrap();

    let ids: Vec<&str> = outcome.results.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["verses:0", "verses:1"]);
    assert!((outcome.results[0].score - 0.9).abs() < 1e-6);
    assert!((outcome.results[1].score - 0.8).abs() < 1e-6);
    assert_eq!(
        outcome.results[1].provenance,
        vec![Provenance::Vector, Provenance::Theme]
    );
}

#[tokio::test]
async fn budget_walk_stops_before_overflow() {
    let settings = FusionSettings {
        token_budget: 300,
        ..FusionSettings::default()
    };
    let (engine, _, _) =
        seeded_engine(settings, vec![hit("verses:0", 0.9), hit("verses:1", 0.6)]).await;

    let outcome = engine
        .search("karma", 10, &SearchFilters::default())
        .await
        .unwrap();

    // 200 + 150 would exceed 300, so only the top chunk survives.
    let spent: usize = outcome.results.iter().map(|r| r.chunk.token_count).sum();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].chunk.id, "verses:0");
    assert!(spent <= 300);
}

#[tokio::test]
async fn chunk_cap_bounds_selection() {
    let settings = FusionSettings {
        token_budget: 10_000,
        max_chunks: 1,
        ..FusionSettings::default()
    };
    let (engine, _, _) =
        seeded_engine(settings, vec![hit("verses:0", 0.9), hit("verses:1", 0.6)]).await;

    let outcome = engine
        .search("karma", 10, &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].chunk.id, "verses:0");
}

#[tokio::test]
async fn unmatched_query_is_empty_not_error() {
    let (engine, _, _) = seeded_engine(FusionSettings::default(), Vec::new()).await;

    let outcome = engine
        .search("xylophone quux", 10, &SearchFilters::default())
        .await
        .unwrap();
    assert!(outcome.is_empty());
}

#[tokio::test]
async fn stale_candidates_yield_suggestions() {
    let (engine, chunks, _) =
        seeded_engine(FusionSettings::default(), Vec::new()).await;
    // Delete the corpus after the rebuild; index entries now hold stale ids.
    chunks.remove_document("verses").await.unwrap();

    let outcome = engine
        .search("karma", 10, &SearchFilters::default())
        .await
        .unwrap();
    assert!(outcome.is_empty());
    assert!(outcome
        .suggested_themes
        .iter()
        .any(|t| t == "karma"));
}

#[tokio::test]
async fn failed_vector_stream_degrades_to_remaining_streams() {
    let (_engine, _chunks, index) = seeded_engine(FusionSettings::default(), Vec::new()).await;
    let similarity = Arc::new(SimilaritySearch::new(
        Arc::new(FailingProvider),
        Arc::new(ScriptedVectors { hits: Vec::new() }),
    ));
    let engine = FusionEngine::new(similarity, index, FusionSettings::default());

    let outcome = engine
        .search("karma", 10, &SearchFilters::default())
        .await
        .unwrap();

    // Theme routing alone still finds the themed chunk, at its base score.
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].chunk.id, "verses:1");
    assert!((outcome.results[0].score - 0.5).abs() < 1e-6);
    assert_eq!(outcome.results[0].provenance, vec![Provenance::Theme]);
}

#[tokio::test]
async fn all_streams_failing_is_an_error() {
    let index = Arc::new(MasterIndex::new(
        Arc::new(FailingIndexStore),
        Arc::new(MemoryChunkStore::new()),
        &IndexCacheSettings::default(),
    ));
    let similarity = Arc::new(SimilaritySearch::new(
        Arc::new(FailingProvider),
        Arc::new(ScriptedVectors { hits: Vec::new() }),
    ));
    let engine = FusionEngine::new(similarity, index, FusionSettings::default());

    let err = engine
        .search("karma", 10, &SearchFilters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
}
