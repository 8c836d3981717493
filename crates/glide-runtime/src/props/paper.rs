//! View-manager backend: batched commits, no settle detection.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glide_core::{FrameScheduler, StyleProps, Tag};

use super::{PaperCommit, ViewDescriptor};

/// One entry of a view-manager commit.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperOperation {
    pub tag: Tag,
    /// View type name used to resolve the view manager.
    pub name: String,
    pub updates: StyleProps,
}

struct PaperInner {
    scheduler: FrameScheduler,
    committer: Rc<dyn PaperCommit>,
    default_view_name: String,
    operations: RefCell<Vec<PaperOperation>>,
}

/// Batched prop commits through [`PaperCommit`]. Records append in call order.
#[derive(Clone)]
pub struct PaperPropsManager {
    inner: Rc<PaperInner>,
}

impl PaperPropsManager {
    pub fn new(
        scheduler: FrameScheduler,
        committer: Rc<dyn PaperCommit>,
        default_view_name: impl Into<String>,
    ) -> Self {
        Self {
            inner: Rc::new(PaperInner {
                scheduler,
                committer,
                default_view_name: default_view_name.into(),
                operations: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn update(&self, descriptors: &[ViewDescriptor], updates: &StyleProps) {
        let schedule_flush = {
            let mut operations = self.inner.operations.borrow_mut();
            let was_empty = operations.is_empty();
            operations.extend(descriptors.iter().map(|descriptor| PaperOperation {
                tag: descriptor.tag,
                name: descriptor
                    .name
                    .clone()
                    .unwrap_or_else(|| self.inner.default_view_name.clone()),
                updates: updates.clone(),
            }));
            was_empty && !operations.is_empty()
        };

        if schedule_flush {
            let this = self.clone();
            self.inner.scheduler.queue_microtask(move || this.flush());
        }
    }

    pub fn flush(&self) {
        let mut operations = std::mem::take(&mut *self.inner.operations.borrow_mut());
        if operations.is_empty() {
            return;
        }
        log::trace!("paper commit of {} operations", operations.len());
        self.inner.committer.commit(&operations);

        operations.clear();
        let mut pending = self.inner.operations.borrow_mut();
        if pending.is_empty() {
            *pending = operations;
        }
    }

    pub fn pending_operations(&self) -> usize {
        self.inner.operations.borrow().len()
    }
}

impl fmt::Debug for PaperPropsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaperPropsManager")
            .field("pending_operations", &self.pending_operations())
            .field("default_view_name", &self.inner.default_view_name)
            .finish()
    }
}
