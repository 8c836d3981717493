//! Glide: animated prop commits and layout transitions for a native view tree.
//!
//! This facade re-exports the workspace crates:
//! - [`config`]: `glide.toml` loading with environment overrides
//! - [`base`]: prop values, animations, mutable values, and the frame scheduler
//! - [`runtime`]: the commit pipeline, settling handoff, and layout animation manager

pub use glide_config as config;
pub use glide_core as base;
pub use glide_runtime as runtime;

pub use glide_config::GlideConfig;
pub use glide_runtime::{GlideError, Result, UiRuntime};
