//! Embedding provider implementations.
//!
//! | Provider | Model | Dimensions | Deployment |
//! |----------|-------|-----------|------------|
//! | [`FastEmbedProvider`] | BGE-small-en-v1.5 | 384 | Local, default |
//! | [`HttpEmbeddingProvider`] | configurable | configurable | Remote (OpenAI/VoyageAI-shaped API) |
//! | [`NullEmbeddingProvider`] | n/a | 1 | Tests only |
//!
//! [`RetryingEmbeddingProvider`] wraps any of the above to retry transient
//! failures with bounded exponential backoff before surfacing
//! [`crate::domain::error::Error::Embedding`].

pub mod fastembed;
pub mod http;
pub mod null;
pub mod retry;

pub use self::fastembed::FastEmbedProvider;
pub use http::HttpEmbeddingProvider;
pub use null::NullEmbeddingProvider;
pub use retry::{RetryPolicy, RetryingEmbeddingProvider};
