//! Engine assembly and the file-to-corpus ingest pipeline.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use walkdir::WalkDir;

use versedb_chunk::{default_strategies, normalize_source, Chunker, IngestStrategy, RawSource};
use versedb_core::config::Settings;
use versedb_core::error::{Error, Result};
use versedb_core::store::MemoryChunkStore;
use versedb_core::traits::{ChunkStore, VectorStore};
use versedb_core::types::{Chunk, EmbeddingRecord, Meta};
use versedb_fusion::FusionEngine;
use versedb_index::{MasterIndex, MemoryIndexStore, RebuildStats};
use versedb_vector::{HashEmbedder, MemoryVectorStore, RetryingProvider, SimilaritySearch};

use crate::snapshot::Snapshot;

const SOURCE_EXTENSIONS: [&str; 3] = ["txt", "md", "json"];

/// Per-document ingest accounting.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestReport {
    pub chunks: usize,
    pub overflow_chunks: usize,
    pub skipped_sections: usize,
}

/// The assembled retrieval core: in-memory stores wired to the chunking,
/// indexing, similarity and fusion engines.
pub struct Engines {
    pub chunks: Arc<MemoryChunkStore>,
    pub vectors: Arc<MemoryVectorStore>,
    pub index: Arc<MasterIndex>,
    pub similarity: Arc<SimilaritySearch>,
    pub fusion: FusionEngine,
    chunker: Chunker,
    strategies: Vec<Box<dyn IngestStrategy>>,
}

impl Engines {
    pub fn build(settings: &Settings) -> Self {
        let chunks = Arc::new(MemoryChunkStore::new());
        let vectors = Arc::new(MemoryVectorStore::new());
        let index = Arc::new(MasterIndex::new(
            Arc::new(MemoryIndexStore::new()),
            chunks.clone(),
            &settings.index_cache,
        ));
        let similarity = Arc::new(SimilaritySearch::new(
            Arc::new(RetryingProvider::new(
                HashEmbedder::default(),
                settings.retry.clone(),
            )),
            vectors.clone(),
        ));
        let fusion = FusionEngine::new(similarity.clone(), index.clone(), settings.fusion.clone());
        Self {
            chunks,
            vectors,
            index,
            similarity,
            fusion,
            chunker: Chunker::new(settings.chunking.clone()),
            strategies: default_strategies(),
        }
    }

    /// Normalize, chunk, embed and store one raw source.
    pub async fn ingest_source(&self, source: &RawSource) -> Result<IngestReport> {
        let payload = normalize_source(source, &self.strategies)?;
        let mut outcome = self.chunker.chunk_document(&payload)?;
        self.similarity.embed_chunks(&mut outcome.chunks).await?;
        let report = IngestReport {
            chunks: outcome.chunks.len(),
            overflow_chunks: outcome.overflow_chunks,
            skipped_sections: outcome.skipped_sections,
        };
        self.chunks
            .put_document(outcome.document, outcome.chunks)
            .await?;
        Ok(report)
    }

    /// Ingest from a file on disk. A malformed or empty payload is an
    /// [`Error::Ingest`]; callers skip it and continue the batch.
    pub async fn ingest_file(&self, path: &Path, category: &str) -> Result<IngestReport> {
        let source = read_source(path, category)?;
        self.ingest_source(&source).await
    }

    pub async fn rebuild_index(&self) -> Result<RebuildStats> {
        self.index.rebuild().await
    }

    /// Current corpus as a serializable snapshot.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            documents: self.chunks.documents().await?,
            chunks: self.chunks.all_chunks().await?,
        })
    }

    /// Restore a snapshot into the stores and rebuild the index. Chunks that
    /// carry an embedding are re-registered with the vector store; the rest
    /// stay reachable through the index streams only.
    pub async fn restore(&self, snapshot: Snapshot) -> Result<RebuildStats> {
        let mut by_document: HashMap<String, Vec<Chunk>> = HashMap::new();
        let mut records = Vec::new();
        for chunk in snapshot.chunks {
            if let Some(vector) = &chunk.embedding {
                records.push(EmbeddingRecord {
                    chunk_id: chunk.id.clone(),
                    document: chunk.document.clone(),
                    themes: chunk.themes.clone(),
                    vector: vector.clone(),
                });
            }
            by_document
                .entry(chunk.document.clone())
                .or_default()
                .push(chunk);
        }
        for document in snapshot.documents {
            let chunks = by_document.remove(&document.name).unwrap_or_default();
            self.chunks.put_document(document, chunks).await?;
        }
        for (document, _) in by_document {
            warn!(document = %document, "snapshot chunks without a document record, dropped");
        }
        self.vectors.upsert(records).await?;
        self.index.rebuild().await
    }
}

/// Source files under `dir`, in a stable order.
pub fn scan_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        })
        .collect();
    files.sort();
    files
}

/// Build a raw source from a file; the file stem becomes the document name.
pub fn read_source(path: &Path, category: &str) -> Result<RawSource> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Ingest(format!("unusable file name '{}'", path.display())))?
        .to_string();
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Ingest(format!("cannot read '{}': {}", path.display(), e)))?;
    let mut metadata = Meta::new();
    metadata.insert("source_path".to_string(), path.display().to_string());
    Ok(RawSource {
        name,
        category: category.to_string(),
        content,
        metadata,
    })
}
