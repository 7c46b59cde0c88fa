//! Error types for loading scope defaults.
use std::result::Result as StdResult;

use thiserror::Error;

/// Result alias for defaults loading.
pub type Result<T> = StdResult<T, DefaultsError>;

/// Errors produced while loading [`HotkeysDefaults`](crate::HotkeysDefaults).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefaultsError {
    /// The RON text could not be parsed into defaults.
    #[error("invalid hotkey defaults: {message}")]
    Parse {
        /// Parser message, including the position.
        message: String,
    },
}
