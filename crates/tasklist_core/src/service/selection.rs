//! Transient multi-select state for batch deletion.
//!
//! # Invariants
//! - Selection is independent of the persisted `done` flag.
//! - Ids of deleted tasks may linger until the next clear; consumers treat
//!   them as no-ops.

use crate::model::task::TaskId;
use std::collections::BTreeSet;

/// Set of task ids marked for batch deletion. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    ids: BTreeSet<TaskId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` when `selected`, removes it otherwise.
    pub fn toggle(&mut self, id: TaskId, selected: bool) {
        if selected {
            self.ids.insert(id);
        } else {
            self.ids.remove(&id);
        }
    }

    pub fn is_selected(&self, id: TaskId) -> bool {
        self.ids.contains(&id)
    }

    /// Current selection in ascending id order.
    pub fn selected_ids(&self) -> Vec<TaskId> {
        self.ids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
