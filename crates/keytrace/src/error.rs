//! Error handling for the keytrace crate.

use std::{io, result};

use hotkeys_reactive::{DefaultsError, engine, keyspec};
use thiserror::Error;

/// Convenient result type for keytrace operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running a session.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The defaults file could not be parsed.
    #[error("defaults: {0}")]
    Defaults(#[from] DefaultsError),
    /// A binding was rejected by the engine.
    #[error("binding: {0}")]
    Bind(#[from] engine::Error),
    /// A script step names an invalid hotkey.
    #[error("invalid script step {token:?}: {source}")]
    Step {
        /// The offending token.
        token: String,
        /// Underlying parse failure.
        #[source]
        source: keyspec::Error,
    },
    /// A script step is not in any recognised form.
    #[error("invalid script step {token:?}: {reason}")]
    Malformed {
        /// The offending token.
        token: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}
