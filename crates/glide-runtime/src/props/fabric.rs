//! Shadow-tree backend with settle detection.
//!
//! Updates for the same tag within one synchronous turn merge into a single
//! operation. The batch is committed from a microtask, after which every
//! committed tag is checked for settling: once no update has landed for
//! `settle_threshold_ms` of frame time, the tag's last snapshot is handed to
//! the control thread exactly once.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use glide_core::{FrameScheduler, StyleProps, Tag};

use super::ledger::UpdateLedger;
use super::{FabricCommit, ShadowNodeHandle, ViewDescriptor};
use crate::dispatch::ControlDispatcher;

/// One entry of a shadow-tree commit.
#[derive(Debug, Clone, PartialEq)]
pub struct FabricOperation {
    pub shadow_node: Option<ShadowNodeHandle>,
    pub tag: Tag,
    pub updates: StyleProps,
}

#[derive(Default)]
struct FabricBatch {
    operations: Vec<FabricOperation>,
    index_by_tag: HashMap<Tag, usize>,
    /// Tags with a settle check already waiting for the next frame.
    scheduled_checks: HashSet<Tag>,
    commits: u64,
}

struct FabricInner {
    scheduler: FrameScheduler,
    ledger: UpdateLedger,
    dispatcher: ControlDispatcher,
    committer: Rc<dyn FabricCommit>,
    settle_threshold_ms: f64,
    batch: RefCell<FabricBatch>,
}

/// Batched prop commits through [`FabricCommit`].
///
/// Cloning yields another handle to the same batch.
#[derive(Clone)]
pub struct FabricPropsManager {
    inner: Rc<FabricInner>,
}

impl FabricPropsManager {
    pub fn new(
        scheduler: FrameScheduler,
        ledger: UpdateLedger,
        dispatcher: ControlDispatcher,
        committer: Rc<dyn FabricCommit>,
        settle_threshold_ms: f64,
    ) -> Self {
        Self {
            inner: Rc::new(FabricInner {
                scheduler,
                ledger,
                dispatcher,
                committer,
                settle_threshold_ms,
                batch: RefCell::new(FabricBatch::default()),
            }),
        }
    }

    pub fn settle_threshold_ms(&self) -> f64 {
        self.inner.settle_threshold_ms
    }

    /// Queue `updates` for every descriptor. The first record of a batch
    /// schedules the flush.
    pub fn update(&self, descriptors: &[ViewDescriptor], updates: &StyleProps) {
        let schedule_flush = {
            let mut batch = self.inner.batch.borrow_mut();
            let was_empty = batch.operations.is_empty();
            for descriptor in descriptors {
                match batch.index_by_tag.get(&descriptor.tag).copied() {
                    Some(index) => batch.operations[index].updates.merge(updates),
                    None => {
                        let index = batch.operations.len();
                        batch.operations.push(FabricOperation {
                            shadow_node: descriptor.shadow_node.clone(),
                            tag: descriptor.tag,
                            updates: updates.clone(),
                        });
                        batch.index_by_tag.insert(descriptor.tag, index);
                    }
                }
            }
            was_empty && !batch.operations.is_empty()
        };

        if schedule_flush {
            let this = self.clone();
            self.inner.scheduler.queue_microtask(move || this.flush());
        }
    }

    /// Commit the pending batch, run settle checks for its tags, then clear it.
    pub fn flush(&self) {
        let mut operations = {
            let mut batch = self.inner.batch.borrow_mut();
            batch.index_by_tag.clear();
            std::mem::take(&mut batch.operations)
        };
        if operations.is_empty() {
            return;
        }

        log::trace!("fabric commit of {} operations", operations.len());
        self.inner.committer.commit(&operations);
        self.inner.batch.borrow_mut().commits += 1;

        for operation in &operations {
            self.check_update(operation.tag);
        }

        operations.clear();
        let mut batch = self.inner.batch.borrow_mut();
        if batch.operations.is_empty() {
            batch.operations = operations;
        }
    }

    /// Hand the tag's snapshot to the control thread once it has settled,
    /// otherwise look again on the next frame.
    pub fn check_update(&self, tag: Tag) {
        let (Some(now), Some(last_update)) = (
            self.inner.scheduler.frame_timestamp(),
            self.inner.ledger.last_frame_time(tag),
        ) else {
            return;
        };

        if now - last_update >= self.inner.settle_threshold_ms {
            if let Some(props) = self.inner.ledger.take_settled(tag) {
                log::debug!("view {tag} settled after {:.1}ms", now - last_update);
                self.inner.dispatcher.dispatch(tag, props);
            }
            return;
        }

        // Frame callbacks cannot be cancelled, so at most one per tag is in flight
        if !self.inner.batch.borrow_mut().scheduled_checks.insert(tag) {
            return;
        }
        let this = self.clone();
        self.inner.scheduler.request_frame(move |_| {
            this.inner.batch.borrow_mut().scheduled_checks.remove(&tag);
            this.check_update(tag);
        });
    }

    /// Drop ledger state for an unregistered view.
    pub fn forget(&self, tag: Tag) {
        self.inner.ledger.forget(tag);
    }

    pub fn pending_operations(&self) -> usize {
        self.inner.batch.borrow().operations.len()
    }

    pub fn has_scheduled_check(&self, tag: Tag) -> bool {
        self.inner.batch.borrow().scheduled_checks.contains(&tag)
    }

    /// Number of commits issued so far.
    pub fn commit_count(&self) -> u64 {
        self.inner.batch.borrow().commits
    }
}

impl fmt::Debug for FabricPropsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let batch = self.inner.batch.borrow();
        f.debug_struct("FabricPropsManager")
            .field("pending_operations", &batch.operations.len())
            .field("scheduled_checks", &batch.scheduled_checks.len())
            .field("settle_threshold_ms", &self.inner.settle_threshold_ms)
            .finish()
    }
}
