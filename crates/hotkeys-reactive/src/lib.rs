//! hotkeys-reactive: keyboard shortcuts as reactive primitives.
//!
//! Bindings are created inside a reactive scope (see [`signals::create_root`])
//! and live exactly as long as it:
//!
//! - [`bind_hotkey`]: one hotkey, re-registered when its inputs change.
//! - [`bind_sequence`]: a multi-key sequence.
//! - [`bind_recorder`]: interactive shortcut capture with reactive state.
//! - [`held_keys`], [`held_key_codes`], [`key_held`]: the global key state as signals.
//! - [`hotkeys_provider`]: scope-wide default options.
//!
//! Matching, timing and event capture belong to the engine; this crate only
//! decides when engine registrations are created, refreshed and released.
//! The engine and the reactive runtime are re-exported as [`engine`] and
//! [`signals`].

pub use keyengine as engine;
pub use keyspec;
pub use signals;

mod error;
pub use error::DefaultsError;

mod options;
pub use options::{HotkeysDefaults, SequenceBindOptions};

mod resolve;
pub use resolve::{
    MaybeAccessor, Overlay, ResolvedHotkey, ResolvedSequence, normalize_hotkey, resolve_hotkey,
    resolve_recorder, resolve_sequence,
};

mod provider;
pub use provider::{
    HotkeysContext, hotkeys_provider, use_default_hotkeys_options, use_hotkeys_context,
};

mod hotkey;
pub use hotkey::bind_hotkey;

mod sequence;
pub use sequence::bind_sequence;

mod recorder;
pub use recorder::{HotkeyRecorderBinding, bind_recorder};

mod held_keys;
pub use held_keys::{held_key_codes, held_keys, store_signal};

mod key_hold;
pub use key_hold::key_held;

pub use keyengine::{
    EventKind, EventTarget, HotkeyCallbackContext, HotkeyOptions, KeyboardEvent, RecorderOptions,
    document, set_document,
};
pub use keyspec::{Platform, RawHotkey, RegisterableHotkey};
