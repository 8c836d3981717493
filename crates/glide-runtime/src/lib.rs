//! Prop commit pipeline and layout animations for the glide render thread.
//!
//! This crate provides:
//! - **Props**: per-turn batching of animated prop updates onto a native
//!   commit primitive (Fabric, Paper, or a synchronous host setter)
//! - **Settling**: per-tag detection of finished motion, handing the final
//!   snapshot to the control thread once
//! - **Layout animations**: one merged transition per tag with native progress reporting
//! - **Registry**: control-thread lookup of live components by tag
//! - **Commit hook**: reconciling control-thread commits with animated props
//!
//! # Threads
//!
//! ```text
//! render thread                          control thread
//! ─────────────                          ──────────────
//! UiRuntime::tick ─► FrameScheduler
//!   LayoutAnimationsManager
//!   PropsUpdater ─► UpdatePropsManager
//!                     └─ settle ─► ControlDispatcher ══► ControlQueue ─► ComponentRegistry
//! ```

pub mod commit_hook;
pub mod dispatch;
pub mod error;
pub mod layout;
pub mod props;
pub mod registry;
pub mod runtime;

pub use commit_hook::AnimatedPropsStore;
pub use dispatch::{ControlDispatcher, ControlQueue, SettledProps, control_channel};
pub use error::{GlideError, Result};
pub use layout::{
    LayoutAnimationConfig, LayoutAnimationType, LayoutAnimationsManager, NoopCoordinator,
    ProgressObserver, SharedTransitionCoordinator, StartTiming,
};
pub use props::{
    FabricCommit, FabricOperation, FabricPropsManager, PaperCommit, PaperOperation,
    PaperPropsManager, PassthroughProcessor, PropsProcessor, PropsUpdater, ShadowNodeHandle,
    UpdateLedger, UpdatePropsManager, ViewDescriptor, ViewDescriptors, WebCommit,
};
pub use registry::{AnimatedComponent, ComponentRegistry, update_props_on_control_thread};
pub use runtime::{UiRuntime, UiRuntimeBuilder};
