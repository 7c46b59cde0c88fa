use std::{cell::Cell, collections::BTreeSet, time::Duration, time::Instant};

use keyspec::{Modifier, ParsedHotkey};
use serde::{Deserialize, Serialize};

thread_local! {
    /// Reference point for event timestamps on this thread.
    static EPOCH: Instant = Instant::now();
}

/// Time elapsed since the first event timestamp was taken on this thread.
fn now() -> Duration {
    EPOCH.with(Instant::elapsed)
}

/// Kind of keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    KeyDown,
    KeyUp,
}

/// A keyboard event as delivered to listeners on an [`EventTarget`](crate::EventTarget).
///
/// `key` is the logical key ("a", "Shift", "Escape"); `code` is the physical key
/// ("KeyA", "ShiftLeft"). Modifier flags describe the modifier state at the time
/// of the event. `time_stamp` is monotonic per thread and can be set explicitly
/// with [`KeyboardEvent::at`].
#[derive(Debug, Clone)]
pub struct KeyboardEvent {
    pub kind: EventKind,
    pub key: String,
    pub code: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    /// OS auto-repeat.
    pub repeat: bool,
    pub time_stamp: Duration,
    /// Set by a listener that consumed the event.
    default_prevented: Cell<bool>,
    /// Set by a listener to stop further propagation along the target path.
    propagation_stopped: Cell<bool>,
}

impl KeyboardEvent {
    /// A new event of `kind` for `key`, with no modifiers and an empty code.
    pub fn new(kind: EventKind, key: &str) -> Self {
        Self {
            kind,
            key: key.to_string(),
            code: String::new(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
            repeat: false,
            time_stamp: now(),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// A key down event for `key`.
    pub fn key_down(key: &str) -> Self {
        Self::new(EventKind::KeyDown, key)
    }

    /// A key up event for `key`.
    pub fn key_up(key: &str) -> Self {
        Self::new(EventKind::KeyUp, key)
    }

    /// An event carrying the key and modifier state of `hotkey`.
    pub fn from_hotkey(kind: EventKind, hotkey: &ParsedHotkey) -> Self {
        let mut ev = Self::new(kind, &hotkey.key);
        for m in &hotkey.modifiers {
            ev.set_modifier(*m, true);
        }
        ev
    }

    /// Set the physical key code.
    pub fn with_code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    /// Set one modifier flag.
    pub fn with_modifier(mut self, m: Modifier) -> Self {
        self.set_modifier(m, true);
        self
    }

    /// Mark the event as an OS auto-repeat.
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Override the timestamp (milliseconds).
    pub fn at(mut self, millis: u64) -> Self {
        self.time_stamp = Duration::from_millis(millis);
        self
    }

    /// Set or clear the flag for `m`.
    pub fn set_modifier(&mut self, m: Modifier, on: bool) {
        match m {
            Modifier::Control => self.ctrl = on,
            Modifier::Alt => self.alt = on,
            Modifier::Shift => self.shift = on,
            Modifier::Meta => self.meta = on,
        }
    }

    /// True when the flag for `m` is set.
    pub fn has_modifier(&self, m: Modifier) -> bool {
        match m {
            Modifier::Control => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Shift => self.shift,
            Modifier::Meta => self.meta,
        }
    }

    /// Modifier flags as a set.
    pub fn modifiers(&self) -> BTreeSet<Modifier> {
        Modifier::ALL
            .into_iter()
            .filter(|m| self.has_modifier(*m))
            .collect()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

#[cfg(test)]
mod tests {
    use keyspec::{Platform, parse_hotkey};

    use super::*;

    #[test]
    fn from_hotkey_sets_flags() {
        let h = parse_hotkey("Control+Shift+K", Platform::Linux).expect("parse");
        let ev = KeyboardEvent::from_hotkey(EventKind::KeyDown, &h);
        assert_eq!(ev.key, "K");
        assert!(ev.ctrl && ev.shift);
        assert!(!ev.alt && !ev.meta);
        assert_eq!(ev.modifiers(), h.modifiers);
    }

    #[test]
    fn flags_are_sticky() {
        let ev = KeyboardEvent::key_down("a");
        assert!(!ev.default_prevented());
        ev.prevent_default();
        ev.stop_propagation();
        assert!(ev.default_prevented());
        assert!(ev.propagation_stopped());
    }
}
