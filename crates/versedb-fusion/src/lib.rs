//! Result fusion: merge the vector, master-index and theme streams into one
//! ranked list, then select a token-budgeted subset.

pub mod engine;
pub mod merge;

pub use engine::{FusionEngine, FusionOutcome};
pub use merge::{merge_streams, select_within_budget, Candidate};
