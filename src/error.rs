//! Error types for the sequencer and its drivers

use thiserror::Error;

/// Result type alias for sequencer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or awaiting sequences
#[derive(Error, Debug)]
pub enum Error {
    /// The sequence was canceled before its end event fired
    #[error("Sequence canceled before completion")]
    Canceled,

    /// Every handle to a stalled sequence was dropped
    #[error("Sequence dropped before completion")]
    Abandoned,

    /// No plugin is registered under the requested name
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    /// A plugin factory rejected its arguments
    #[error("Invalid arguments for plugin '{plugin}': {reason}")]
    InvalidArguments { plugin: String, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed sequence script
    #[error("Script error: {0}")]
    ScriptError(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_args(plugin: &str, reason: impl Into<String>) -> Self {
        Error::InvalidArguments {
            plugin: plugin.to_string(),
            reason: reason.into(),
        }
    }
}
