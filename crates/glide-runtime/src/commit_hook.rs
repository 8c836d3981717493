//! Reconciling control-thread commits with in-flight animated props.
//!
//! Animated props reach the native tree without going through the control
//! thread, so a control-thread commit would otherwise overwrite them with
//! stale declarative values. [`AnimatedPropsStore`] remembers the latest
//! animated props per tag (it is the [`FabricCommit`] target) and overlays
//! them onto every control-thread commit. Once the control thread already
//! carries a tag's animated values, typically after the settle handoff, the
//! entry is no longer needed and is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use glide_core::{StyleProps, Tag};

use crate::props::{FabricCommit, FabricOperation};

#[derive(Debug, Default)]
struct StoreState {
    props_by_tag: HashMap<Tag, StyleProps>,
    commits: u64,
}

/// Latest animated props per tag, shared between the render thread (writer)
/// and whichever thread commits the control-thread tree.
#[derive(Debug, Clone, Default)]
pub struct AnimatedPropsStore {
    state: Arc<Mutex<StoreState>>,
}

static_assertions::assert_impl_all!(AnimatedPropsStore: Send, Sync, Clone);

impl AnimatedPropsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay stored animated props onto a pending control-thread commit.
    ///
    /// For every tag present in both, the stored props win over the committed
    /// ones. Entries whose props were already fully present in the commit are
    /// removed from the store; their tags are returned.
    pub fn will_commit(&self, committed: &mut HashMap<Tag, StyleProps>) -> Vec<Tag> {
        let mut state = self.state.lock();
        let mut synced = Vec::new();
        for (tag, props) in committed.iter_mut() {
            let Some(animated) = state.props_by_tag.get(tag) else {
                continue;
            };
            if animated.is_subset_of(props) {
                synced.push(*tag);
            } else {
                props.merge(animated);
            }
        }
        for tag in &synced {
            state.props_by_tag.remove(tag);
        }
        synced.sort();
        if !synced.is_empty() {
            log::debug!("{} animated views synced with the control thread", synced.len());
        }
        synced
    }

    pub fn props_for(&self, tag: Tag) -> Option<StyleProps> {
        self.state.lock().props_by_tag.get(&tag).cloned()
    }

    /// Drop the entry for an unregistered view.
    pub fn remove(&self, tag: Tag) -> Option<StyleProps> {
        self.state.lock().props_by_tag.remove(&tag)
    }

    pub fn len(&self) -> usize {
        self.state.lock().props_by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of render-thread commits received.
    pub fn commit_count(&self) -> u64 {
        self.state.lock().commits
    }
}

impl FabricCommit for AnimatedPropsStore {
    fn commit(&self, batch: &[FabricOperation]) {
        let mut state = self.state.lock();
        state.commits += 1;
        for operation in batch {
            state
                .props_by_tag
                .entry(operation.tag)
                .or_default()
                .merge(&operation.updates);
        }
    }
}
