//! Global held-key tracking.

use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use keyspec::normalize_key_name;
use tracing::trace;

use crate::{EventKind, EventTarget, KeyboardEvent, ListenerId, Store, document};

/// Keys currently held down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Normalised key names in press order.
    pub held_keys: Vec<String>,
    /// Physical code of each held key, keyed by normalised name.
    pub held_codes: BTreeMap<String, String>,
}

/// Inner state of a [`KeyStateTracker`].
struct TrackerInner {
    store: Store<KeyState>,
    listener: RefCell<Option<(EventTarget, ListenerId)>>,
}

/// Tracks which keys are down by listening to the document in the capture phase.
#[derive(Clone)]
pub struct KeyStateTracker {
    inner: Rc<TrackerInner>,
}

thread_local! {
    static TRACKER: KeyStateTracker = KeyStateTracker::new();
}

/// The key state tracker shared by everything on this thread, attached to the
/// current document.
pub fn get_key_state_tracker() -> KeyStateTracker {
    let tracker = TRACKER.with(Clone::clone);
    tracker.ensure_listener();
    tracker
}

impl Default for KeyStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStateTracker {
    /// Create a detached tracker. Most callers want [`get_key_state_tracker`].
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TrackerInner {
                store: Store::new(KeyState::default()),
                listener: RefCell::new(None),
            }),
        }
    }

    /// The state store.
    pub fn store(&self) -> Store<KeyState> {
        self.inner.store.clone()
    }

    /// Case-insensitive check against the held keys.
    pub fn is_key_held(&self, key: &str) -> bool {
        let key = normalize_key_name(key);
        self.inner
            .store
            .with_state(|s| s.held_keys.iter().any(|k| k.eq_ignore_ascii_case(&key)))
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn reset(&self) {
        if self.inner.store.with_state(|s| s.held_keys.is_empty()) {
            return;
        }
        trace!("key_state_reset");
        self.inner.store.set_state(|s| *s = KeyState::default());
    }

    /// Follow the current document, moving the listener if it changed.
    pub fn ensure_listener(&self) {
        let current = document();
        {
            let attached = self.inner.listener.borrow();
            if attached.as_ref().map(|(t, _)| t) == current.as_ref() {
                return;
            }
        }
        if let Some((old, id)) = self.inner.listener.borrow_mut().take() {
            old.remove_listener(id);
        }
        let Some(doc) = current else {
            return;
        };
        let weak = Rc::downgrade(&self.inner);
        let id = doc.add_listener(true, move |event| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.observe(event);
            }
        });
        *self.inner.listener.borrow_mut() = Some((doc, id));
    }

    /// Apply one event to the held set. Subscribers are notified only on change.
    pub fn observe(&self, event: &KeyboardEvent) {
        let key = normalize_key_name(&event.key);
        let code = event.code.clone();
        let changed = self.inner.store.with_state(|s| {
            let held = s.held_keys.iter().any(|k| k.eq_ignore_ascii_case(&key));
            match event.kind {
                EventKind::KeyDown => {
                    !held || (!code.is_empty() && s.held_codes.get(&key) != Some(&code))
                }
                EventKind::KeyUp => held,
            }
        });
        if !changed {
            return;
        }
        trace!(key = %key, code = %code, kind = ?event.kind, "key_state_changed");
        self.inner.store.set_state(|s| match event.kind {
            EventKind::KeyDown => {
                if !s.held_keys.iter().any(|k| k.eq_ignore_ascii_case(&key)) {
                    s.held_keys.push(key.clone());
                }
                if !code.is_empty() {
                    s.held_codes.insert(key, code);
                }
            }
            EventKind::KeyUp => {
                s.held_keys.retain(|k| !k.eq_ignore_ascii_case(&key));
                s.held_codes.retain(|k, _| !k.eq_ignore_ascii_case(&key));
            }
        });
    }
}

impl fmt::Debug for KeyStateTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStateTracker")
            .field("state", &self.inner.store.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn press_and_release() {
        let t = KeyStateTracker::new();
        t.observe(&KeyboardEvent::key_down("Shift").with_code("ShiftLeft"));
        t.observe(&KeyboardEvent::key_down("a").with_code("KeyA"));
        let s = t.store().snapshot();
        assert_eq!(s.held_keys, vec!["Shift", "A"]);
        assert_eq!(s.held_codes.get("Shift").map(String::as_str), Some("ShiftLeft"));
        assert!(t.is_key_held("shift"));
        t.observe(&KeyboardEvent::key_up("Shift").with_code("ShiftLeft"));
        assert!(!t.is_key_held("Shift"));
        assert!(!t.store().snapshot().held_codes.contains_key("Shift"));
        t.reset();
        assert_eq!(t.store().snapshot(), KeyState::default());
    }

    #[test]
    fn repeats_do_not_notify() {
        let t = KeyStateTracker::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let unsub = t.store().subscribe(move || h.set(h.get() + 1));
        t.observe(&KeyboardEvent::key_down("a").with_code("KeyA"));
        t.observe(&KeyboardEvent::key_down("a").with_code("KeyA").repeated());
        t.observe(&KeyboardEvent::key_up("b"));
        assert_eq!(hits.get(), 1);
        unsub.unsubscribe();
    }

    #[test]
    fn follows_document() {
        let doc = document().expect("document");
        let t = get_key_state_tracker();
        t.reset();
        doc.dispatch(&KeyboardEvent::key_down("x"));
        assert!(t.is_key_held("X"));
        doc.dispatch(&KeyboardEvent::key_up("x"));
        assert!(!t.is_key_held("X"));
    }

    proptest! {
        #[test]
        fn press_release_round_trip(key in "[A-Za-z0-9]{1,8}") {
            let t = KeyStateTracker::new();
            t.observe(&KeyboardEvent::key_down(&key));
            prop_assert!(t.is_key_held(&key));
            t.observe(&KeyboardEvent::key_up(&key));
            prop_assert!(!t.is_key_held(&key));
            prop_assert!(t.store().snapshot().held_keys.is_empty());
        }
    }
}
