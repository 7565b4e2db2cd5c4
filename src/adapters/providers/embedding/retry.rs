//! Bounded exponential-backoff retry wrapper for embedding providers.
//!
//! Wraps any [`EmbeddingProvider`] and retries `embed_batch` when the
//! inner provider's [`Error::Embedding`] message looks transient (see
//! [`looks_transient`]) — rate limits, timeouts, connection resets. A
//! provider whose failures never match that heuristic simply never gets
//! retried, making this wrapper a no-op for it.

use crate::domain::error::{Error, Result};
use crate::domain::ports::EmbeddingProvider;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Retry policy: bounded attempts with jittered exponential backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first, non-retried call.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            factor: 2.0,
        }
    }
}

/// Classifies an embedding error as transient (retry-worthy) or permanent.
///
/// A provider's own errors arrive as [`Error::Embedding`]; since the retry
/// wrapper sits outside the provider, it has no way to distinguish "rate
/// limited" from "bad API key" except by message inspection.
pub fn looks_transient(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("timeout")
        || lower.contains("rate limit")
        || lower.contains("429")
        || lower.contains("connection")
        || lower.contains("503")
        || lower.contains("502")
        || lower.contains("reset by peer")
}

/// Classifies an embedding error as an oversize-input failure: a single
/// text exceeded the provider's maximum input length. Same message-content
/// heuristic as [`looks_transient`], since the error type is collapsed to
/// a single [`Error::Embedding`] at the adapter boundary.
pub fn looks_oversize(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("maximum context length")
        || lower.contains("too long")
        || lower.contains("too many tokens")
        || lower.contains("exceeds")
        || lower.contains("oversize")
}

/// Wraps an [`EmbeddingProvider`], retrying batches that fail with what
/// looks like a transient error, up to `policy.max_attempts`.
pub struct RetryingEmbeddingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: EmbeddingProvider> RetryingEmbeddingProvider<P> {
    /// Wrap `inner` with the default retry policy.
    pub fn new(inner: P) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    /// Wrap `inner` with an explicit retry policy.
    pub fn with_policy(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for RetryingEmbeddingProvider<P> {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut delay = self.policy.base_delay;
        let mut last_err = None;

        for attempt in 1..=self.policy.max_attempts {
            match self.inner.embed_batch(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(Error::Embedding { provider, message }) if looks_transient(&message) => {
                    tracing::warn!(
                        provider = %provider,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        backoff_ms = delay.as_millis() as u64,
                        "transient embedding failure, retrying"
                    );
                    last_err = Some(Error::Embedding { provider, message });
                    if attempt < self.policy.max_attempts {
                        let jitter_ms = rand::rng().random_range(0..50);
                        tokio::time::sleep(delay + Duration::from_millis(jitter_ms)).await;
                        delay = delay.mul_f64(self.policy.factor);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        let err = last_err.expect("loop runs at least once");
        if let Error::Embedding { provider, .. } = &err {
            tracing::error!(provider = %provider, "embedding retry budget exhausted");
        }
        Err(err)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn max_input_tokens(&self) -> Option<usize> {
        self.inner.max_input_tokens()
    }
}
