//! Multi-key sequences ("G G", "D I W").
//!
//! The [`SequenceManager`] listens to key down events on the document in the
//! capture phase, so hotkeys that stop propagation cannot starve it. Each
//! registration tracks how far into its sequence the user has typed; progress
//! resets when the gap between two steps exceeds the registration's timeout.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

use keyspec::{
    ParsedHotkey, Platform, detect_platform, is_modifier_key, normalize_key_name, parse_hotkey,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    Error, EventKind, EventTarget, HotkeyCallback, HotkeyCallbackContext, KeyboardEvent,
    ListenerId, Result, document, matcher::matches_event,
};

/// Default maximum gap between two steps of a sequence.
pub const DEFAULT_SEQUENCE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Options for one sequence registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceOptions {
    pub enabled: bool,
    /// Maximum gap between steps; [`DEFAULT_SEQUENCE_TIMEOUT`] when absent.
    pub timeout: Option<Duration>,
    pub platform: Option<Platform>,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: None,
            platform: None,
        }
    }
}

/// One registered sequence and its progress.
struct SequenceEntry {
    label: String,
    steps: Vec<ParsedHotkey>,
    callback: HotkeyCallback,
    enabled: bool,
    timeout: Duration,
    progress: usize,
    last_step: Option<Duration>,
}

impl SequenceEntry {
    /// Feed one key down; returns true when the sequence completed.
    fn advance(&mut self, event: &KeyboardEvent) -> bool {
        if self.progress > 0
            && self
                .last_step
                .is_some_and(|t| event.time_stamp.saturating_sub(t) > self.timeout)
        {
            trace!(sequence = %self.label, "sequence_timeout");
            self.progress = 0;
        }
        if matches_event(&self.steps[self.progress], event) {
            self.progress += 1;
        } else if matches_event(&self.steps[0], event) {
            self.progress = 1;
        } else {
            self.progress = 0;
            self.last_step = None;
            return false;
        }
        self.last_step = Some(event.time_stamp);
        if self.progress == self.steps.len() {
            self.progress = 0;
            self.last_step = None;
            return true;
        }
        false
    }
}

/// Inner state of a [`SequenceManager`].
struct SequenceInner {
    entries: RefCell<BTreeMap<u64, SequenceEntry>>,
    listener: RefCell<Option<(EventTarget, ListenerId)>>,
    next_id: Cell<u64>,
}

/// Shared handle to the sequence registry.
#[derive(Clone)]
pub struct SequenceManager {
    inner: Rc<SequenceInner>,
}

thread_local! {
    static SEQUENCES: SequenceManager = SequenceManager::new();
}

/// The sequence manager shared by everything on this thread.
pub fn get_sequence_manager() -> SequenceManager {
    SEQUENCES.with(Clone::clone)
}

impl Default for SequenceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceManager {
    /// Create an independent manager. Most callers want [`get_sequence_manager`].
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SequenceInner {
                entries: RefCell::new(BTreeMap::new()),
                listener: RefCell::new(None),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Register `sequence`. Each step is parsed as a hotkey string.
    ///
    /// Without a document the registration is kept but stays inert until a
    /// later registration finds one.
    pub fn register(
        &self,
        sequence: &[String],
        callback: HotkeyCallback,
        options: SequenceOptions,
    ) -> Result<SequenceUnregister> {
        if sequence.is_empty() {
            return Err(Error::EmptySequence);
        }
        let platform = options.platform.unwrap_or_else(detect_platform);
        let steps = sequence
            .iter()
            .enumerate()
            .map(|(index, s)| {
                parse_hotkey(s, platform).map_err(|source| Error::SequenceStep { index, source })
            })
            .collect::<Result<Vec<_>>>()?;

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let label = sequence.join(" ");
        debug!(id, sequence = %label, "sequence_registered");
        self.inner.entries.borrow_mut().insert(
            id,
            SequenceEntry {
                label,
                steps,
                callback,
                enabled: options.enabled,
                timeout: options.timeout.unwrap_or(DEFAULT_SEQUENCE_TIMEOUT),
                progress: 0,
                last_step: None,
            },
        );
        self.ensure_listener();
        Ok(SequenceUnregister {
            id,
            manager: Rc::downgrade(&self.inner),
        })
    }

    /// Number of live registrations.
    pub fn registration_count(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Labels of live registrations ("G G"), in registration order.
    pub fn sequences(&self) -> Vec<String> {
        self.inner
            .entries
            .borrow()
            .values()
            .map(|e| e.label.clone())
            .collect()
    }

    /// Clear typed progress of every registration.
    pub fn reset_progress(&self) {
        for e in self.inner.entries.borrow_mut().values_mut() {
            e.progress = 0;
            e.last_step = None;
        }
    }

    fn ensure_listener(&self) {
        if self.inner.listener.borrow().is_some() {
            return;
        }
        let Some(doc) = document() else {
            trace!("sequence_listener_no_document");
            return;
        };
        let weak = Rc::downgrade(&self.inner);
        let id = doc.add_listener(true, move |event| {
            if let Some(inner) = weak.upgrade() {
                handle_event(&inner, event);
            }
        });
        *self.inner.listener.borrow_mut() = Some((doc, id));
    }
}

impl fmt::Debug for SequenceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceManager")
            .field("sequences", &self.sequences())
            .finish()
    }
}

fn handle_event(inner: &SequenceInner, event: &KeyboardEvent) {
    if event.kind != EventKind::KeyDown
        || event.repeat
        || is_modifier_key(&normalize_key_name(&event.key))
    {
        return;
    }
    let mut completed: Vec<(u64, HotkeyCallback, HotkeyCallbackContext)> = Vec::new();
    {
        let mut entries = inner.entries.borrow_mut();
        for (id, entry) in entries.iter_mut().filter(|(_, e)| e.enabled) {
            if entry.advance(event) {
                let parsed = entry.steps[entry.steps.len() - 1].clone();
                completed.push((
                    *id,
                    entry.callback.clone(),
                    HotkeyCallbackContext {
                        hotkey: entry.label.clone(),
                        parsed,
                    },
                ));
            }
        }
    }
    for (id, callback, ctx) in completed {
        if !inner.entries.borrow().contains_key(&id) {
            continue;
        }
        debug!(id, sequence = %ctx.hotkey, "sequence_fired");
        callback(event, &ctx);
    }
}

fn unregister(inner: &SequenceInner, id: u64) {
    let removed = inner.entries.borrow_mut().remove(&id);
    if let Some(entry) = removed {
        debug!(id, sequence = %entry.label, "sequence_unregistered");
    }
    if inner.entries.borrow().is_empty()
        && let Some((doc, listener)) = inner.listener.borrow_mut().take()
    {
        doc.remove_listener(listener);
    }
}

/// Token returned by [`SequenceManager::register`]; consuming it removes the
/// registration.
#[must_use = "dropping a SequenceUnregister leaves the sequence registered"]
pub struct SequenceUnregister {
    id: u64,
    manager: Weak<SequenceInner>,
}

impl SequenceUnregister {
    pub fn unregister(self) {
        if let Some(inner) = self.manager.upgrade() {
            unregister(&inner, self.id);
        }
    }
}

impl fmt::Debug for SequenceUnregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceUnregister")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use keyspec::Modifier;

    use super::*;

    fn seq(steps: &[&str]) -> Vec<String> {
        steps.iter().map(|s| s.to_string()).collect()
    }

    fn counter() -> (Rc<Cell<u32>>, HotkeyCallback) {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        (hits, Rc::new(move |_, _| h.set(h.get() + 1)))
    }

    fn linux() -> SequenceOptions {
        SequenceOptions {
            platform: Some(Platform::Linux),
            ..SequenceOptions::default()
        }
    }

    fn press(key: &str, at: u64) {
        let doc = document().expect("document");
        doc.dispatch(&KeyboardEvent::key_down(key).at(at));
        doc.dispatch(&KeyboardEvent::key_up(key).at(at + 1));
    }

    #[test]
    fn completes_within_timeout() {
        let mgr = SequenceManager::new();
        let (hits, cb) = counter();
        let token = mgr.register(&seq(&["G", "G"]), cb, linux()).expect("register");
        press("g", 0);
        press("g", 100);
        assert_eq!(hits.get(), 1);
        press("g", 200);
        assert_eq!(hits.get(), 1);
        press("g", 300);
        assert_eq!(hits.get(), 2);
        token.unregister();
        assert_eq!(mgr.registration_count(), 0);
    }

    #[test]
    fn timeout_resets_progress() {
        let mgr = SequenceManager::new();
        let (hits, cb) = counter();
        let opts = SequenceOptions {
            timeout: Some(Duration::from_millis(500)),
            ..linux()
        };
        let token = mgr.register(&seq(&["D", "I", "W"]), cb, opts).expect("register");
        press("d", 0);
        press("i", 100);
        press("w", 1000);
        assert_eq!(hits.get(), 0);
        press("d", 2000);
        press("i", 2100);
        press("w", 2200);
        assert_eq!(hits.get(), 1);
        token.unregister();
    }

    #[test]
    fn modifier_presses_and_repeats_are_ignored() {
        let mgr = SequenceManager::new();
        let (hits, cb) = counter();
        let token = mgr
            .register(&seq(&["Shift+A", "B"]), cb, linux())
            .expect("register");
        let doc = document().expect("document");
        doc.dispatch(&KeyboardEvent::key_down("Shift").at(0));
        doc.dispatch(
            &KeyboardEvent::key_down("A")
                .with_modifier(Modifier::Shift)
                .at(10),
        );
        doc.dispatch(
            &KeyboardEvent::key_down("A")
                .with_modifier(Modifier::Shift)
                .repeated()
                .at(20),
        );
        doc.dispatch(&KeyboardEvent::key_down("b").at(30));
        assert_eq!(hits.get(), 1);
        token.unregister();
    }

    #[test]
    fn wrong_key_restarts_at_first_step() {
        let mgr = SequenceManager::new();
        let (hits, cb) = counter();
        let token = mgr.register(&seq(&["G", "T"]), cb, linux()).expect("register");
        press("g", 0);
        press("g", 10);
        press("t", 20);
        assert_eq!(hits.get(), 1);
        token.unregister();
    }

    #[test]
    fn disabled_registration_never_fires() {
        let mgr = SequenceManager::new();
        let (hits, cb) = counter();
        let opts = SequenceOptions {
            enabled: false,
            ..linux()
        };
        let token = mgr.register(&seq(&["X"]), cb, opts).expect("register");
        press("x", 0);
        assert_eq!(hits.get(), 0);
        token.unregister();
    }

    #[test]
    fn errors() {
        let mgr = SequenceManager::new();
        let (_, cb) = counter();
        assert!(matches!(
            mgr.register(&[], cb.clone(), linux()),
            Err(Error::EmptySequence)
        ));
        assert!(matches!(
            mgr.register(&seq(&["G", "Hyper+X"]), cb, linux()),
            Err(Error::SequenceStep { index: 1, .. })
        ));
        assert_eq!(mgr.registration_count(), 0);
    }

    #[test]
    fn listener_detached_after_last_unregister() {
        let doc = document().expect("document");
        let before = doc.listener_count();
        let mgr = SequenceManager::new();
        let (_, cb) = counter();
        let a = mgr.register(&seq(&["A"]), cb.clone(), linux()).expect("register");
        let b = mgr.register(&seq(&["B"]), cb, linux()).expect("register");
        assert_eq!(doc.listener_count(), before + 1);
        a.unregister();
        assert_eq!(doc.listener_count(), before + 1);
        b.unregister();
        assert_eq!(doc.listener_count(), before);
    }
}
