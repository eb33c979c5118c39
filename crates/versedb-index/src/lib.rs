//! Master index: term-to-chunk routing with importance scoring.
//!
//! The index is wholly derived data, rebuilt wholesale from the current chunk
//! set and swapped in atomically. Queries are served through a bounded,
//! time-limited hot-entry cache in front of the backing store.

pub mod builder;
pub mod cache;
pub mod query;
pub mod store;

pub use builder::{build_entries, importance_score};
pub use cache::{Clock, HotEntryCache, SystemClock};
pub use query::{MasterIndex, RebuildStats};
pub use store::MemoryIndexStore;
