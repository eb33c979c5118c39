//! Embedding providers: a deterministic offline embedder and a retry
//! decorator for flaky remote providers.

use async_trait::async_trait;
use rand::Rng;
use std::hash::Hasher;
use std::time::Duration;
use tracing::warn;
use twox_hash::XxHash64;

use versedb_core::config::RetrySettings;
use versedb_core::error::{Error, Result};
use versedb_core::traits::EmbeddingProvider;

/// Deterministic hashed bag-of-words embedding.
///
/// Each word hashes into a bucket with a hash-derived sign; the vector is
/// L2-normalized. No model weights, fully offline, stable across runs, so it
/// suits tests and the CLI when no real provider is configured.
/// Not a semantic embedding; overlapping vocabulary scores high, paraphrase
/// does not.
pub struct HashEmbedder {
    id: String,
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            id: format!("hash:d{dim}"),
            dim,
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::Provider("cannot embed empty text".to_string()));
        }
        let mut vector = vec![0.0f32; self.dim];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(word.as_bytes());
            let hash = hasher.finish();
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

/// Wraps a provider with a fixed per-call timeout and bounded exponential
/// backoff with jitter. After the attempt budget is spent the typed provider
/// failure surfaces to the caller; there is no indefinite retrying.
pub struct RetryingProvider<P> {
    inner: P,
    settings: RetrySettings,
}

impl<P: EmbeddingProvider> RetryingProvider<P> {
    pub fn new(inner: P, settings: RetrySettings) -> Self {
        Self { inner, settings }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for RetryingProvider<P> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let timeout = Duration::from_secs(self.settings.timeout_secs);
        let mut last_error = String::new();
        for attempt in 0..self.settings.max_attempts {
            match tokio::time::timeout(timeout, self.inner.embed(text)).await {
                Ok(Ok(vector)) => return Ok(vector),
                Ok(Err(err)) => last_error = err.to_string(),
                Err(_) => last_error = format!("timed out after {timeout:?}"),
            }
            if attempt + 1 < self.settings.max_attempts {
                let backoff = self.settings.base_delay_ms * 2u64.pow(attempt);
                let jitter = rand::thread_rng().gen_range(0..=self.settings.base_delay_ms / 2);
                warn!(
                    attempt = attempt + 1,
                    backoff_ms = backoff + jitter,
                    error = %last_error,
                    "embedding call failed, backing off"
                );
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
            }
        }
        Err(Error::Provider(format!(
            "{} attempts exhausted: {last_error}",
            self.settings.max_attempts
        )))
    }
}
