//! Error types and result alias for the keyspec crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced while parsing hotkey strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The hotkey string was empty or only whitespace.
    #[error("empty hotkey")]
    Empty,
    /// A `+`-separated component was empty (e.g. "Control++S").
    #[error("empty component in hotkey '{spec}'")]
    EmptyComponent {
        /// The full hotkey string.
        spec: String,
    },
    /// A component before the final key was not a known modifier.
    #[error("unknown modifier '{token}' in hotkey '{spec}'")]
    UnknownModifier {
        /// The full hotkey string.
        spec: String,
        /// The offending component.
        token: String,
    },
}
