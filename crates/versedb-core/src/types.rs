//! Domain types shared by the chunking, indexing, vector and fusion engines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;

/// Open key-value metadata attached to documents and chunks.
///
/// Source formats vary, so this is deliberately schemaless. Known (but
/// non-exhaustive) keys: `source_path`, `section`, `strategy`.
pub type Meta = HashMap<String, String>;

/// A named source text in the corpus.
///
/// Created at ingest; `total_chunks` is updated when the chunk count changes.
/// Never mutated by the query path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document name (e.g., "bhagavad_gita").
    pub name: String,
    /// Display title.
    pub title: String,
    /// Hierarchical category (e.g., "/scripture/gita").
    pub category: String,
    /// Language variants carried by the document, primary first.
    pub languages: Vec<String>,
    /// Number of chunks produced from this document.
    pub total_chunks: usize,
    pub metadata: Meta,
}

/// The atomic retrievable unit of source text.
///
/// `exact_reference` is the unit of citation truth: it is derived
/// deterministically at chunking time and must never be regenerated for an
/// existing chunk. Derived fields (`summary`, `themes`, `keywords`,
/// `embedding`) may be refreshed by an idempotent upsert keyed on `id`;
/// `content` and `exact_reference` may not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    /// Owning document name; chunks are cascade-deleted with their document.
    pub document: String,
    /// Ordinal position within the document.
    pub position: usize,
    /// Primary textual content.
    pub content: String,
    /// Optional secondary-language rendering of the same passage.
    pub secondary_content: Option<String>,
    /// Stable human-readable reference, `document:section:ordinal`.
    pub exact_reference: String,
    /// Token estimate for `content` (see [`crate::tokens::estimate_tokens`]).
    pub token_count: usize,
    /// Short generated summary of the chunk.
    pub summary: String,
    pub themes: Vec<String>,
    pub keywords: Vec<String>,
    /// Embedding vector, appended during processing.
    pub embedding: Option<Vec<f32>>,
    /// Whether the chunk covers a complete structural section or a sub-split.
    pub complete_section: bool,
    pub metadata: Meta,
}

/// Kind of term held by a master-index entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexType {
    Theme,
    Keyword,
    BookAlias,
}

/// A term-level routing record in the master index.
///
/// At most one entry exists per `(term, index_type)` pair. Entries are wholly
/// derived from the current chunk set and rebuilt wholesale; chunk ids are
/// weak references and may go stale after a chunk deletion (stale ids are
/// skipped at materialization, never dereferenced unsafely).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub index_type: IndexType,
    pub term: String,
    /// Secondary-language equivalent of the term, when known.
    pub secondary_term: Option<String>,
    pub chunk_ids: Vec<ChunkId>,
    /// Names of the documents the term appears in.
    pub documents: Vec<String>,
    /// Count of (term, chunk) occurrences.
    pub frequency: usize,
    /// Continuous [0,1] weight combining frequency and cross-document spread.
    pub importance: f32,
    pub cross_refs: HashMap<String, String>,
}

/// Which retrieval stream produced (or boosted) a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Provenance {
    Vector,
    MasterIndex,
    Theme,
}

/// A raw per-stream hit: chunk id plus the stream's own score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: Provenance,
}

/// A fused, materialized result. Exists only within the lifetime of a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub chunk: Chunk,
    pub score: f32,
    /// Every stream that contributed to the fused score.
    pub provenance: Vec<Provenance>,
}

/// Filters applied during similarity search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Restrict to these document names (empty = no restriction).
    pub documents: Vec<String>,
    /// Restrict to chunks tagged with at least one of these themes.
    pub themes: Vec<String>,
    /// Drop hits scoring below this similarity.
    pub min_score: Option<f32>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.themes.is_empty() && self.min_score.is_none()
    }
}

/// A chunk embedding as stored by a vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub chunk_id: ChunkId,
    pub document: String,
    pub themes: Vec<String>,
    pub vector: Vec<f32>,
}
