//! Prop update pipeline.
//!
//! Animated prop updates produced on the render thread are batched per
//! synchronous turn and committed to the native view tree in one call. The
//! Fabric backend additionally watches each tag for settling and hands the
//! final snapshot to the control thread.
//!
//! # Architecture
//!
//! ```text
//! PropsUpdater::update
//!   ├── UpdateLedger (last snapshot + frame time per tag)
//!   └── UpdatePropsManager
//!         ├── Fabric  → FabricCommit  → settle check → ControlDispatcher
//!         ├── Paper   → PaperCommit
//!         └── Unavailable (host environment; see PropsUpdater::Web)
//! ```

pub mod fabric;
pub mod ledger;
pub mod manager;
pub mod paper;

use std::fmt;
use std::sync::Arc;

use glide_core::{MutableValue, StyleProps, Tag};

pub use fabric::{FabricOperation, FabricPropsManager};
pub use ledger::UpdateLedger;
pub use manager::{PropsUpdater, UpdatePropsManager};
pub use paper::{PaperOperation, PaperPropsManager};

/// Opaque handle to a node in the native shadow tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShadowNodeHandle(pub Arc<str>);

impl ShadowNodeHandle {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }
}

/// One view targeted by an animated style.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDescriptor {
    pub tag: Tag,
    /// Shadow-tree node (Fabric).
    pub shadow_node: Option<ShadowNodeHandle>,
    /// View type name used to resolve a view manager (Paper).
    pub name: Option<String>,
}

impl ViewDescriptor {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            shadow_node: None,
            name: None,
        }
    }

    pub fn with_shadow_node(mut self, node: ShadowNodeHandle) -> Self {
        self.shadow_node = Some(node);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Reactive, ordered list of views an animated style writes to.
pub type ViewDescriptors = MutableValue<Vec<ViewDescriptor>>;

/// Shadow-tree commit primitive.
pub trait FabricCommit {
    fn commit(&self, batch: &[FabricOperation]);
}

/// View-manager commit primitive.
pub trait PaperCommit {
    fn commit(&self, batch: &[PaperOperation]);
}

/// Host-environment prop setter; applies synchronously to one element.
pub trait WebCommit {
    fn apply(&self, tag: Tag, updates: &StyleProps, is_animated_props: bool);
}

/// Platform-specific rewriting of props before commit (color packing,
/// transform-origin normalisation, ...). Runs after the ledger has recorded
/// the unprocessed snapshot.
pub trait PropsProcessor {
    fn process(&self, updates: &mut StyleProps);
}

/// Processor that leaves props untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughProcessor;

impl PropsProcessor for PassthroughProcessor {
    fn process(&self, _updates: &mut StyleProps) {}
}

impl fmt::Display for ViewDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}{}", self.tag),
            None => write!(f, "{}", self.tag),
        }
    }
}
