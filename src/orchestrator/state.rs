//! Per-codebase observable state and single-writer enforcement.

use crate::domain::error::{Error, Result};
use crate::domain::types::CodebaseState;
use dashmap::DashMap;
use std::sync::Arc;

/// Tracks each codebase's state and guarantees at most one `indexCodebase`
/// or `reindexByChange` call is in flight per codebase id at a time.
#[derive(Debug, Default)]
pub struct CodebaseStateTracker {
    states: DashMap<String, CodebaseState>,
    writers: DashMap<String, ()>,
}

impl CodebaseStateTracker {
    /// Construct an empty tracker; every codebase starts `Absent`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current observable state of `id`, `Absent` if never recorded.
    pub fn state_of(&self, id: &str) -> CodebaseState {
        self.states.get(id).map(|s| *s).unwrap_or(CodebaseState::Absent)
    }

    /// Record a new observable state for `id`.
    pub fn set_state(&self, id: &str, state: CodebaseState) {
        self.states.insert(id.to_string(), state);
    }

    /// Try to become the sole writer for `id`. Returns `Error::Busy` if
    /// another writer already holds it; otherwise returns a guard that
    /// releases the lock when dropped.
    pub fn acquire_writer(self: &Arc<Self>, id: &str) -> Result<WriterGuard> {
        if self.writers.insert(id.to_string(), ()).is_some() {
            return Err(Error::busy(id));
        }
        Ok(WriterGuard {
            tracker: self.clone(),
            id: id.to_string(),
        })
    }
}

/// RAII guard releasing a codebase's write lock on drop.
pub struct WriterGuard {
    tracker: Arc<CodebaseStateTracker>,
    id: String,
}

impl Drop for WriterGuard {
    fn drop(&mut self) {
        self.tracker.writers.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_writer_is_rejected_while_first_holds_the_lock() {
        let tracker = Arc::new(CodebaseStateTracker::new());
        let guard = tracker.acquire_writer("abc12345").unwrap();
        assert!(tracker.acquire_writer("abc12345").is_err());
        drop(guard);
        assert!(tracker.acquire_writer("abc12345").is_ok());
    }

    #[test]
    fn different_ids_do_not_contend() {
        let tracker = Arc::new(CodebaseStateTracker::new());
        let _a = tracker.acquire_writer("aaaaaaaa").unwrap();
        assert!(tracker.acquire_writer("bbbbbbbb").is_ok());
    }
}
