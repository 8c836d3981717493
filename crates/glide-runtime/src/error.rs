//! Error types for the glide runtime.

use thiserror::Error;

use glide_core::Tag;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, GlideError>;

/// Errors that can occur in the commit pipeline.
#[derive(Error, Debug)]
pub enum GlideError {
    /// The prop update manager was used in an environment without a native commit primitive.
    #[error("`UpdatePropsManager` is not available on non-native platform")]
    ManagerUnavailable,

    /// The control thread has shut down and no longer receives settled props.
    #[error("control thread is gone; settled props for {0} were dropped")]
    ControlThreadClosed(Tag),

    /// The runtime builder is missing a collaborator the selected backend needs.
    #[error("runtime builder is missing {0}")]
    MissingCollaborator(&'static str),

    /// Configuration could not be loaded or holds an unusable value.
    #[error("configuration error: {0}")]
    Config(#[from] glide_config::ConfigError),
}
