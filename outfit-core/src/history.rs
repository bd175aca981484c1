//! Undo/redo history of fits.
//!
//! History is a linear list of immutable checkpoints with one active
//! pointer: checkpoints before it are the undo stack, checkpoints after it
//! the redo stack. Each checkpoint is stored under a fresh random key and
//! the ordering itself is persisted as an index document, so a history
//! reopened over the same [`CheckpointStore`] continues where it left off.
//!
//! ```text
//!   past: [k1, k2]   active: k3   future: [k4, k5]
//!   undo  -> past: [k1]      active: k2   future: [k3, k4, k5]
//!   commit(c) from there -> future dropped (k3..k5 deleted)
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkpoint::CheckpointStore;
use crate::error::CoreResult;
use crate::fit::Fit;

/// Storage key of the history index.
pub const HISTORY_INDEX_KEY: &str = "outfit-history-index";

/// Prefix of checkpoint storage keys.
pub const CHECKPOINT_KEY_PREFIX: &str = "outfit-fit-";

/// Coarse position within the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// Nothing committed yet.
    Empty,
    /// The active checkpoint is the newest one.
    AtHead,
    /// Undo has been used; redo is available.
    MidHistory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HistoryIndex {
    past: Vec<String>,
    active: Option<String>,
    future: VecDeque<String>,
}

/// Undo/redo history over a checkpoint store.
#[derive(Debug)]
pub struct History<S: CheckpointStore> {
    store: S,
    index: HistoryIndex,
}

impl<S: CheckpointStore> History<S> {
    /// Open the history kept in `store`.
    ///
    /// A missing index starts an empty history. An unreadable index is
    /// logged and also starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to read the index.
    pub fn open(store: S) -> CoreResult<Self> {
        let index = match store.get(HISTORY_INDEX_KEY)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse history index, starting fresh: {e}");
                HistoryIndex::default()
            }),
            None => HistoryIndex::default(),
        };
        Ok(Self { store, index })
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current position within the history.
    #[must_use]
    pub fn state(&self) -> HistoryState {
        match (&self.index.active, self.index.future.is_empty()) {
            (None, _) => HistoryState::Empty,
            (Some(_), true) => HistoryState::AtHead,
            (Some(_), false) => HistoryState::MidHistory,
        }
    }

    /// Whether an undo step exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.index.past.is_empty()
    }

    /// Whether a redo step exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.index.future.is_empty()
    }

    /// Number of undo steps.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.index.past.len()
    }

    /// Number of redo steps.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.index.future.len()
    }

    /// Record a fit as the new active checkpoint.
    ///
    /// Empty fits and fits identical to the active checkpoint are ignored.
    /// Otherwise the redo stack is discarded and its checkpoints deleted.
    /// Returns whether a checkpoint was written.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails.
    pub fn commit(&mut self, fit: &Fit) -> CoreResult<bool> {
        if fit.is_empty() {
            return Ok(false);
        }
        let json = fit.to_json()?;
        if let Some(active) = &self.index.active {
            if self.store.get(active)?.as_deref() == Some(json.as_str()) {
                tracing::debug!("Fit unchanged, checkpoint skipped");
                return Ok(false);
            }
        }

        let key = format!("{CHECKPOINT_KEY_PREFIX}{}", Uuid::new_v4());
        self.store.put(&key, json)?;
        if let Some(previous) = self.index.active.replace(key) {
            self.index.past.push(previous);
        }
        for stale in std::mem::take(&mut self.index.future) {
            self.store.remove(&stale)?;
        }
        self.persist_index()?;
        Ok(true)
    }

    /// Step back one checkpoint and return the fit now active.
    ///
    /// Returns `Ok(None)` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn undo(&mut self) -> CoreResult<Option<Fit>> {
        let Some(previous) = self.index.past.pop() else {
            return Ok(None);
        };
        if let Some(current) = self.index.active.replace(previous) {
            self.index.future.push_front(current);
        }
        self.persist_index()?;
        self.active_fit()
    }

    /// Step forward one checkpoint and return the fit now active.
    ///
    /// Returns `Ok(None)` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn redo(&mut self) -> CoreResult<Option<Fit>> {
        let Some(next) = self.index.future.pop_front() else {
            return Ok(None);
        };
        if let Some(current) = self.index.active.replace(next) {
            self.index.past.push(current);
        }
        self.persist_index()?;
        self.active_fit()
    }

    /// The active checkpoint's fit.
    ///
    /// A checkpoint that is missing or unparsable yields an empty fit.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn active_fit(&self) -> CoreResult<Option<Fit>> {
        let Some(key) = &self.index.active else {
            return Ok(None);
        };
        let fit = match self.store.get(key)? {
            Some(json) => Fit::from_json(&json).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse checkpoint {key}: {e}");
                Fit::default()
            }),
            None => {
                tracing::warn!("Checkpoint {key} missing from storage");
                Fit::default()
            }
        };
        Ok(Some(fit))
    }

    fn persist_index(&mut self) -> CoreResult<()> {
        let json = serde_json::to_string(&self.index)?;
        self.store.put(HISTORY_INDEX_KEY, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use crate::fit::FitEntry;
    use crate::selection::Position;

    fn fit(item: &str) -> Fit {
        let mut fit = Fit::new();
        fit.insert(
            "hat".into(),
            FitEntry {
                item: item.into(),
                position: Position::default(),
                color: String::new(),
            },
        );
        fit
    }

    fn history() -> History<MemoryCheckpointStore> {
        History::open(MemoryCheckpointStore::new()).expect("history opens")
    }

    #[test]
    fn test_empty_history() {
        let mut history = history();
        assert_eq!(history.state(), HistoryState::Empty);
        assert_eq!(history.undo().expect("undo"), None);
        assert_eq!(history.redo().expect("redo"), None);
        assert_eq!(history.active_fit().expect("active"), None);
        assert!(!history.commit(&Fit::new()).expect("commit"));
    }

    #[test]
    fn test_undo_redo_returns_to_latest() {
        let mut history = history();
        history.commit(&fit("a")).expect("commit a");
        history.commit(&fit("b")).expect("commit b");
        assert_eq!(history.undo().expect("undo"), Some(fit("a")));
        assert_eq!(history.state(), HistoryState::MidHistory);
        assert_eq!(history.redo().expect("redo"), Some(fit("b")));
        assert_eq!(history.state(), HistoryState::AtHead);
    }

    #[test]
    fn test_commit_after_undo_drops_redo() {
        let mut history = history();
        history.commit(&fit("a")).expect("commit a");
        history.commit(&fit("b")).expect("commit b");
        history.undo().expect("undo");
        assert!(history.commit(&fit("c")).expect("commit c"));
        assert!(!history.can_redo());
        assert_eq!(history.active_fit().expect("active"), Some(fit("c")));
        // index + a + c
        assert_eq!(history.store().len(), 3);
    }

    #[test]
    fn test_duplicate_of_active_is_skipped() {
        let mut history = history();
        assert!(history.commit(&fit("a")).expect("commit"));
        assert!(!history.commit(&fit("a")).expect("commit"));
        assert_eq!(history.undo_depth(), 0);
        assert!(history.commit(&fit("b")).expect("commit"));
        assert!(history.commit(&fit("a")).expect("commit"));
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_reopen_continues() {
        let mut history = history();
        history.commit(&fit("a")).expect("commit a");
        history.commit(&fit("b")).expect("commit b");
        history.undo().expect("undo");

        let store = history.store().clone();
        let mut reopened = History::open(store).expect("reopens");
        assert_eq!(reopened.active_fit().expect("active"), Some(fit("a")));
        assert_eq!(reopened.redo().expect("redo"), Some(fit("b")));
    }

    #[test]
    fn test_corrupt_index_starts_empty() {
        let mut store = MemoryCheckpointStore::new();
        store
            .put(HISTORY_INDEX_KEY, "not json".into())
            .expect("put");
        let history = History::open(store).expect("opens anyway");
        assert_eq!(history.state(), HistoryState::Empty);
    }

    #[test]
    fn test_corrupt_checkpoint_reads_empty() {
        let mut history = history();
        history.commit(&fit("a")).expect("commit a");
        history.commit(&fit("b")).expect("commit b");
        let key = history.index.past[0].clone();
        history.store.put(&key, "garbage".into()).expect("put");
        assert_eq!(history.undo().expect("undo"), Some(Fit::default()));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Commit(u8),
            Undo,
            Redo,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..4).prop_map(Op::Commit),
                Just(Op::Undo),
                Just(Op::Redo),
            ]
        }

        proptest! {
            #[test]
            fn prop_storage_matches_index(ops in prop::collection::vec(op(), 0..30)) {
                let mut history = history();
                for op in ops {
                    match op {
                        Op::Commit(n) => {
                            history.commit(&fit(&n.to_string())).expect("commit");
                        }
                        Op::Undo => {
                            history.undo().expect("undo");
                        }
                        Op::Redo => {
                            history.redo().expect("redo");
                        }
                    }
                    if history.state() == HistoryState::Empty {
                        prop_assert!(history.store().is_empty());
                    } else {
                        // index + past + active + future
                        let expected = history.undo_depth() + history.redo_depth() + 2;
                        prop_assert_eq!(history.store().len(), expected);
                    }
                }
            }
        }
    }
}
