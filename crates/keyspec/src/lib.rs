//! keyspec: hotkey strings for keyboard-event based shortcuts.
//!
//! - [`normalize_key_name`]: canonical spelling for a key name ("esc" -> "Escape", "a" -> "A").
//! - [`Modifier`] and [`Platform`]: modifier keys and the platform-dependent `Mod` alias.
//! - [`ParsedHotkey`]: a set of modifiers plus a single key, with [`parse_hotkey`] and
//!   [`format_hotkey`] converting to and from the canonical `Control+Shift+S` form.
//! - [`RawHotkey`]: a structured descriptor, converted with [`raw_hotkey_to_parsed`].
//! - [`RegisterableHotkey`]: either of the two forms, as accepted by registration APIs.

mod error;
pub use error::{Error, Result};

mod key;
pub use key::{is_modifier_key, key_from_code, normalize_key_name};

mod modifiers;
pub use modifiers::{Modifier, Platform, detect_platform};

mod hotkey;
pub use hotkey::{
    ParsedHotkey, RawHotkey, RegisterableHotkey, format_hotkey, format_portable, parse_hotkey,
    raw_hotkey_to_parsed,
};
