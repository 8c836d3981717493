//! Last-committed state per tag.
//!
//! Every native update shallow-merges into the tag's snapshot and stamps the
//! frame time. The snapshot is what the control thread receives once the tag
//! settles; both entries are dropped at that point or when the view is
//! unregistered.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glide_core::{StyleProps, Tag};

#[derive(Debug, Default)]
struct LedgerState {
    last_update_by_tag: HashMap<Tag, StyleProps>,
    last_update_frame_time_by_tag: HashMap<Tag, f64>,
}

/// Shared handle to the per-runtime update ledger (render thread only).
#[derive(Debug, Clone, Default)]
pub struct UpdateLedger {
    state: Rc<RefCell<LedgerState>>,
}

impl UpdateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `updates` into the tag's snapshot and stamp it with `frame_time`.
    ///
    /// A missing frame time (no frame has run yet) clears the stamp, which
    /// leaves nothing for the settle check to act on.
    pub fn record(&self, tag: Tag, updates: &StyleProps, frame_time: Option<f64>) {
        let mut state = self.state.borrow_mut();
        state
            .last_update_by_tag
            .entry(tag)
            .or_default()
            .merge(updates);
        match frame_time {
            Some(ts) => {
                state.last_update_frame_time_by_tag.insert(tag, ts);
            }
            None => {
                state.last_update_frame_time_by_tag.remove(&tag);
            }
        }
    }

    pub fn last_update(&self, tag: Tag) -> Option<StyleProps> {
        self.state.borrow().last_update_by_tag.get(&tag).cloned()
    }

    pub fn last_frame_time(&self, tag: Tag) -> Option<f64> {
        self.state
            .borrow()
            .last_update_frame_time_by_tag
            .get(&tag)
            .copied()
    }

    /// Remove and return the snapshot of a settled tag.
    pub fn take_settled(&self, tag: Tag) -> Option<StyleProps> {
        let mut state = self.state.borrow_mut();
        state.last_update_frame_time_by_tag.remove(&tag);
        state.last_update_by_tag.remove(&tag)
    }

    /// Drop everything recorded for `tag`.
    pub fn forget(&self, tag: Tag) {
        let mut state = self.state.borrow_mut();
        state.last_update_by_tag.remove(&tag);
        state.last_update_frame_time_by_tag.remove(&tag);
    }

    /// Number of tags with a pending snapshot.
    pub fn len(&self) -> usize {
        self.state.borrow().last_update_by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
