//! Semantic chunking: turns normalized document payloads into ordered,
//! token-bounded, reference-stable chunks with thematic metadata.

pub mod chunker;
pub mod ingest;
pub mod payload;
pub mod tagger;

pub use chunker::{Chunker, ChunkingOutcome};
pub use ingest::{default_strategies, normalize_source, IngestStrategy, RawSource};
pub use payload::{DocumentPayload, SectionPayload};
pub use tagger::ThemeTagger;
