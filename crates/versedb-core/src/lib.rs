//! Shared domain types, traits, configuration and errors for the versedb
//! retrieval core.

pub mod config;
pub mod error;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
