//! Core error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from automaton definitions and the execution engine.
///
/// Every variant is detected before the engine raises its first
/// notification, so a failed run never leaves an observer half-informed.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid automaton definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error("resume state {state} is not a member of the active definition")]
    InvalidResumeState { state: String },

    #[error("start index {index} out of range for input of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown state: {name}")]
    UnknownState { name: String },

    #[error("unknown preset: {name}")]
    UnknownPreset { name: String },

    #[error("failed to read definition '{path}': {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoreError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CoreError::InvalidDefinition {
            reason: reason.into(),
        }
    }

    /// Returns a stable error code suitable for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidDefinition { .. } => "INVALID_DEFINITION",
            CoreError::InvalidResumeState { .. } => "INVALID_RESUME_STATE",
            CoreError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            CoreError::UnknownState { .. } => "UNKNOWN_STATE",
            CoreError::UnknownPreset { .. } => "UNKNOWN_PRESET",
            CoreError::Io { .. } => "IO_ERROR",
            CoreError::Json(_) => "BAD_DEFINITION_FORMAT",
            CoreError::Yaml(_) => "BAD_DEFINITION_FORMAT",
        }
    }

    /// Returns whether the error was caused by the caller's run arguments
    /// rather than by the automaton definition itself.
    pub fn is_run_argument_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidResumeState { .. }
                | CoreError::IndexOutOfRange { .. }
                | CoreError::UnknownState { .. }
        )
    }
}
