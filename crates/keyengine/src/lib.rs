//! keyengine: an in-process keyboard shortcut engine.
//!
//! Events are modelled as [`KeyboardEvent`]s dispatched along a tree of
//! [`EventTarget`]s with capture and bubble phases. On top of that the crate
//! provides four per-thread services:
//!
//! - [`HotkeyManager`]: single hotkey registrations bound to a target.
//! - [`SequenceManager`]: multi-key sequences with a step timeout.
//! - [`HotkeyRecorder`]: interactive capture of a new shortcut.
//! - [`KeyStateTracker`]: the set of keys currently held.
//!
//! Observable state lives in a [`Store`], a synchronous container with change
//! listeners. Nothing here is `Send`; every thread gets its own engine.

mod error;
pub use error::{Error, Result};

mod event;
pub use event::{EventKind, KeyboardEvent};

mod dom;
pub use dom::{EventTarget, ListenerId, document, set_document};

mod store;
pub use store::{Store, Unsubscribe};

mod matcher;
pub use matcher::{key_matches, matches_event};

mod policy;

mod manager;
pub use manager::{
    HotkeyCallback, HotkeyCallbackContext, HotkeyManager, HotkeyOptions,
    HotkeyRegistrationHandle, get_hotkey_manager,
};

mod sequence;
pub use sequence::{
    DEFAULT_SEQUENCE_TIMEOUT, SequenceManager, SequenceOptions, SequenceUnregister,
    get_sequence_manager,
};

mod recorder;
pub use recorder::{
    HotkeyRecorder, RecordCallback, RecorderCallback, RecorderOptions, RecorderState,
};

mod tracker;
pub use tracker::{KeyState, KeyStateTracker, get_key_state_tracker};
