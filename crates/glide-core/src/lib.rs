//! Core building blocks for the glide render thread.
//!
//! This crate provides:
//! - **Types**: view tags, prop values, and shallow-merging style snapshots
//! - **Easing / Interpolation**: timing curves and per-value interpolation
//! - **Mutable values**: single-thread observable cells that can be driven by animations
//! - **Style animations**: per-property descriptors merged by key
//! - **Frame scheduler**: microtask and display-refresh queues with a frame clock
//!
//! # Architecture
//!
//! ```text
//! FrameScheduler
//!   ├── microtasks (run after the current synchronous turn)
//!   └── frame callbacks (run on the next display refresh)
//!
//! MutableValue<StyleProps>
//!   ├── subscribers (keyed by SubscriptionId)
//!   └── running StyleAnimation (stepped by frame callbacks)
//! ```

pub mod animation;
pub mod easing;
pub mod interpolate;
pub mod scheduler;
pub mod types;
pub mod value;

pub use animation::{AnimationCallback, AnimationDescriptor, AnimationSpec, StyleAnimation};
pub use easing::{EasingFunction, StepPosition};
pub use interpolate::Interpolate;
pub use scheduler::{FrameRequestId, FrameScheduler};
pub use types::{PropValue, StyleProps, Tag};
pub use value::{MutableValue, SubscriptionId};
