use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Fewest selected rows for which batch deletion is offered.
pub const BATCH_DELETE_MIN: usize = 2;

/// Row selection of a list page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<Uuid>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: Uuid) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Selects every visible row, or clears the selection when all of them
    /// are already selected.
    pub fn toggle_all(&mut self, visible: &[Uuid]) {
        let all_selected =
            !visible.is_empty() && visible.iter().all(|id| self.selected.contains(id));
        if all_selected {
            self.selected.clear();
        } else {
            self.selected = visible.iter().copied().collect();
        }
    }

    pub fn is_selected(&self, id: &Uuid) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn can_batch_delete(&self) -> bool {
        self.selected.len() >= BATCH_DELETE_MIN
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.selected.iter().copied().collect()
    }

    /// Drops ids that are no longer listed, e.g. after a re-query.
    pub fn retain_visible(&mut self, visible: &[Uuid]) {
        self.selected.retain(|id| visible.contains(id));
    }
}

/// Body of a `batch-delete` request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BatchDeleteRequest {
    pub ids: Vec<Uuid>,
}

impl BatchDeleteRequest {
    /// Duplicate ids count once.
    pub fn selection(&self) -> Selection {
        Selection {
            selected: self.ids.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
pub struct BatchDeleteResult {
    pub deleted: u64,
}
