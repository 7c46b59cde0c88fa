//! Event scripts.
//!
//! A script is a whitespace-separated list of steps:
//!
//! - `Mod+S`: tap a chord (modifiers down, key down, key up, modifiers up)
//! - `+Shift`: press and hold a key
//! - `^Shift`: release a key
//! - `*J`: an auto-repeat key down
//! - `~300`: advance the clock by 300ms
//!
//! Every emitted event advances the clock by [`STEP_MS`], so steps typed
//! back-to-back fall within any sensible sequence timeout.

use std::collections::BTreeSet;

use hotkeys_reactive::{
    EventKind, KeyboardEvent, Platform,
    keyspec::{Modifier, ParsedHotkey, normalize_key_name, parse_hotkey},
};

use crate::error::{Error, Result};

/// Clock advance per emitted event, in milliseconds.
pub const STEP_MS: u64 = 10;

/// One parsed script step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Press and release a chord.
    Tap(ParsedHotkey),
    /// Press a key and keep it held.
    Down(String),
    /// Release a key.
    Up(String),
    /// An auto-repeat key down.
    Repeat(String),
    /// Advance the clock.
    Wait(u64),
}

/// Parse a script.
pub fn parse_script(text: &str, platform: Platform) -> Result<Vec<Step>> {
    text.split_whitespace()
        .map(|token| parse_step(token, platform))
        .collect()
}

/// Parse one whitespace-free token.
fn parse_step(token: &str, platform: Platform) -> Result<Step> {
    let malformed = |reason| Error::Malformed {
        token: token.to_string(),
        reason,
    };
    let key = |rest: &str| {
        if rest.is_empty() {
            Err(malformed("missing key name"))
        } else {
            Ok(normalize_key_name(rest))
        }
    };
    if let Some(ms) = token.strip_prefix('~') {
        return ms
            .parse()
            .map(Step::Wait)
            .map_err(|_| malformed("expected a duration in milliseconds"));
    }
    if let Some(rest) = token.strip_prefix('+') {
        return key(rest).map(Step::Down);
    }
    if let Some(rest) = token.strip_prefix('^') {
        return key(rest).map(Step::Up);
    }
    if let Some(rest) = token.strip_prefix('*') {
        return key(rest).map(Step::Repeat);
    }
    parse_hotkey(token, platform)
        .map(Step::Tap)
        .map_err(|source| Error::Step {
            token: token.to_string(),
            source,
        })
}

/// Turns steps into timestamped events, tracking which modifiers are held.
#[derive(Debug, Default)]
pub struct Player {
    /// Milliseconds since the start of the script.
    clock: u64,
    /// Modifiers currently down.
    held: BTreeSet<Modifier>,
}

impl Player {
    /// A player at time zero with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock, in milliseconds.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// The events for one step, in dispatch order.
    pub fn expand(&mut self, step: &Step) -> Vec<KeyboardEvent> {
        match step {
            Step::Wait(ms) => {
                self.clock += ms;
                Vec::new()
            }
            Step::Down(key) => vec![self.event(EventKind::KeyDown, key)],
            Step::Up(key) => vec![self.event(EventKind::KeyUp, key)],
            Step::Repeat(key) => vec![self.event(EventKind::KeyDown, key).repeated()],
            Step::Tap(hotkey) => {
                let mut out = Vec::new();
                for m in &hotkey.modifiers {
                    out.push(self.event(EventKind::KeyDown, m.to_spec()));
                }
                out.push(self.event(EventKind::KeyDown, &hotkey.key));
                out.push(self.event(EventKind::KeyUp, &hotkey.key));
                for m in hotkey.modifiers.iter().rev() {
                    out.push(self.event(EventKind::KeyUp, m.to_spec()));
                }
                out
            }
        }
    }

    /// One event at the next tick, carrying the held modifier flags.
    fn event(&mut self, kind: EventKind, key: &str) -> KeyboardEvent {
        if let Some(m) = Modifier::from_spec(key) {
            match kind {
                EventKind::KeyDown => self.held.insert(m),
                EventKind::KeyUp => self.held.remove(&m),
            };
        }
        self.clock += STEP_MS;
        let mut ev = KeyboardEvent::new(kind, key).at(self.clock);
        for m in &self.held {
            ev.set_modifier(*m, true);
        }
        ev
    }
}
