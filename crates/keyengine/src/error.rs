//! Error types and result alias for the keyengine crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The hotkey string could not be parsed.
    #[error("invalid hotkey: {0}")]
    Hotkey(#[from] keyspec::Error),
    /// One step of a sequence could not be parsed.
    #[error("invalid sequence step {index}: {source}")]
    SequenceStep {
        /// Zero-based position of the step.
        index: usize,
        /// Underlying parse failure.
        #[source]
        source: keyspec::Error,
    },
    /// A sequence with no steps was registered.
    #[error("empty sequence")]
    EmptySequence,
    /// No explicit target was given and no document is available.
    #[error("no event target available")]
    NoTarget,
}
