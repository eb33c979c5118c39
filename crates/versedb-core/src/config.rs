//! Configuration loader and typed settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `VERSEDB_*`
//! env vars. Typed sections carry serde defaults so a missing file still
//! yields a working configuration. Also provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("VERSEDB_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract the full typed settings tree, falling back to defaults for
    /// anything the merged sources do not provide.
    pub fn settings(&self) -> Settings {
        self.figment.extract().unwrap_or_default()
    }
}

/// All tunables of the retrieval core in one tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub fusion: FusionSettings,
    pub index_cache: IndexCacheSettings,
    pub retry: RetrySettings,
}

/// Chunker tunables (defaults: ~10k-token chunks, 15% overlap).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size in estimated tokens.
    pub target_tokens: usize,
    /// Fraction of a chunk's trailing tokens carried into its successor.
    pub overlap_percent: f32,
    /// A section within `target_tokens * tolerance` is kept whole.
    pub tolerance: f32,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            target_tokens: 10_000,
            overlap_percent: 0.15,
            tolerance: 1.2,
        }
    }
}

/// Fusion scoring and selection tunables.
///
/// The boost/base constants were chosen empirically; they are configuration,
/// not load-bearing constants, and are validated against the scenario tests
/// in `versedb-fusion`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    /// Boost added when a master-index-routed chunk is already present.
    pub index_boost: f32,
    /// Base score for a chunk discovered only via master-index routing.
    pub index_base: f32,
    /// Boost added when a theme-search chunk is already present.
    pub theme_boost: f32,
    /// Base score for a chunk discovered only via theme search.
    pub theme_base: f32,
    /// Maximum total token estimate of the selected chunks.
    pub token_budget: usize,
    /// Absolute cap on selected chunks regardless of remaining budget.
    pub max_chunks: usize,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            index_boost: 0.3,
            index_base: 0.7,
            theme_boost: 0.2,
            theme_base: 0.5,
            token_budget: 24_000,
            max_chunks: 20,
        }
    }
}

/// Bounds for the in-memory hot-entry cache in front of the index store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexCacheSettings {
    /// Number of highest-importance entries kept in memory.
    pub capacity: usize,
    /// Entries older than this are stale and refreshed on next access.
    pub ttl_secs: u64,
}

impl Default for IndexCacheSettings {
    fn default() -> Self {
        Self {
            capacity: 100,
            ttl_secs: 300,
        }
    }
}

/// Retry policy applied around external provider calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// Fixed per-call timeout; an expired call counts as a failed attempt.
    pub timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            timeout_secs: 30,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
