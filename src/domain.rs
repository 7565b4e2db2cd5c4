//! # Domain Layer
//!
//! Core types, errors and port traits for the semantic code search engine.
//! Contains no I/O of its own: adapters depend on the domain, never the
//! reverse.
//!
//! - [`error`] — the engine's error taxonomy
//! - [`ports`] — trait boundaries implemented by adapters, including the
//!   code-splitter and vector-store contracts
//! - [`types`] — value objects: [`types::Chunk`], [`types::SearchHit`], snapshots

/// The engine's error taxonomy
pub mod error;
/// Trait boundaries implemented by adapters
pub mod ports;
/// Core domain value objects
pub mod types;

pub use error::{Error, Result};
pub use types::*;
