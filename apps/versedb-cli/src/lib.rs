//! Shared plumbing for the `versedb` and `versedb-indexer` binaries: engine
//! assembly, the ingest pipeline, and the JSON corpus snapshot.

pub mod pipeline;
pub mod snapshot;

pub use pipeline::Engines;
pub use snapshot::Snapshot;
