//! Interactive shortcut capture.
//!
//! A [`HotkeyRecorder`] listens for the next non-modifier key press while
//! recording and turns it into a portable hotkey string. Escape cancels,
//! Backspace and Delete clear the shortcut. The recorder's state lives in a
//! [`Store`] so it can be observed.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use keyspec::{
    ParsedHotkey, Platform, detect_platform, format_portable, is_modifier_key, key_from_code,
    normalize_key_name,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{EventKind, EventTarget, KeyboardEvent, ListenerId, Store, document};

/// Called with the recorded hotkey string.
pub type RecordCallback = Rc<dyn Fn(&str)>;

/// Called on cancel or clear.
pub type RecorderCallback = Rc<dyn Fn()>;

/// Recorder options. Callbacks are code-only and never serialised.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderOptions {
    #[serde(skip)]
    pub on_record: Option<RecordCallback>,
    #[serde(skip)]
    pub on_cancel: Option<RecorderCallback>,
    #[serde(skip)]
    pub on_clear: Option<RecorderCallback>,
    pub platform: Option<Platform>,
}

impl RecorderOptions {
    /// Key-by-key merge: fields present in `over` replace fields in `self`.
    pub fn overlay(self, over: Self) -> Self {
        Self {
            on_record: over.on_record.or(self.on_record),
            on_cancel: over.on_cancel.or(self.on_cancel),
            on_clear: over.on_clear.or(self.on_clear),
            platform: over.platform.or(self.platform),
        }
    }
}

impl fmt::Debug for RecorderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecorderOptions")
            .field("on_record", &self.on_record.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .field("on_clear", &self.on_clear.is_some())
            .field("platform", &self.platform)
            .finish()
    }
}

/// Observable recorder state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderState {
    pub is_recording: bool,
    /// The most recent recording; cleared when a new recording starts.
    pub recorded_hotkey: Option<String>,
}

/// Inner state of a [`HotkeyRecorder`].
struct RecorderInner {
    store: Store<RecorderState>,
    options: RefCell<RecorderOptions>,
    listener: RefCell<Option<(EventTarget, ListenerId)>>,
    destroyed: Cell<bool>,
}

/// Shared handle to one recorder.
#[derive(Clone)]
pub struct HotkeyRecorder {
    inner: Rc<RecorderInner>,
}

impl HotkeyRecorder {
    pub fn new(options: RecorderOptions) -> Self {
        Self {
            inner: Rc::new(RecorderInner {
                store: Store::new(RecorderState::default()),
                options: RefCell::new(options),
                listener: RefCell::new(None),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// The state store.
    pub fn store(&self) -> Store<RecorderState> {
        self.inner.store.clone()
    }

    /// Begin recording. Listens on the document; without one the recorder
    /// reports recording but never sees a key.
    pub fn start(&self) {
        if self.inner.destroyed.get() {
            return;
        }
        if self.inner.listener.borrow().is_none()
            && let Some(doc) = document()
        {
            let weak = Rc::downgrade(&self.inner);
            let id = doc.add_listener(true, move |event| {
                if let Some(inner) = weak.upgrade() {
                    Self { inner }.handle_event(event);
                }
            });
            *self.inner.listener.borrow_mut() = Some((doc, id));
        }
        debug!("recorder_started");
        self.inner.store.set_state(|s| {
            s.is_recording = true;
            s.recorded_hotkey = None;
        });
    }

    /// Stop recording, keeping whatever was recorded.
    pub fn stop(&self) {
        if !self.detach() {
            return;
        }
        debug!("recorder_stopped");
        self.inner.store.set_state(|s| s.is_recording = false);
    }

    /// Stop recording, discard the recording and call `on_cancel`.
    pub fn cancel(&self) {
        if !self.detach() {
            return;
        }
        debug!("recorder_cancelled");
        self.inner.store.set_state(|s| {
            s.is_recording = false;
            s.recorded_hotkey = None;
        });
        let cb = self.inner.options.borrow().on_cancel.clone();
        if let Some(cb) = cb {
            cb();
        }
    }

    /// Merge `options` into the current options.
    pub fn set_options(&self, options: RecorderOptions) {
        if self.inner.destroyed.get() {
            return;
        }
        let current = self.inner.options.take();
        *self.inner.options.borrow_mut() = current.overlay(options);
    }

    /// Stop listening and drop callbacks. Further calls are no-ops.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        if let Some((doc, id)) = self.inner.listener.borrow_mut().take() {
            doc.remove_listener(id);
        }
        *self.inner.options.borrow_mut() = RecorderOptions::default();
        debug!("recorder_destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Remove the document listener. Returns false when destroyed.
    fn detach(&self) -> bool {
        if self.inner.destroyed.get() {
            return false;
        }
        if let Some((doc, id)) = self.inner.listener.borrow_mut().take() {
            doc.remove_listener(id);
        }
        true
    }

    fn handle_event(&self, event: &KeyboardEvent) {
        if event.kind != EventKind::KeyDown || !self.inner.store.with_state(|s| s.is_recording) {
            return;
        }
        event.prevent_default();
        event.stop_propagation();
        let key = normalize_key_name(&event.key);
        trace!(key = %key, "recorder_key");
        match key.as_str() {
            "Escape" => self.cancel(),
            "Backspace" | "Delete" => self.clear(),
            k if is_modifier_key(k) => {}
            _ => self.record(event, &key),
        }
    }

    fn clear(&self) {
        self.detach();
        debug!("recorder_cleared");
        self.inner.store.set_state(|s| {
            s.is_recording = false;
            s.recorded_hotkey = None;
        });
        let cb = self.inner.options.borrow().on_clear.clone();
        if let Some(cb) = cb {
            cb();
        }
    }

    fn record(&self, event: &KeyboardEvent, key: &str) {
        let modifiers = event.modifiers();
        // With a modifier held the produced character may differ from the key cap.
        let key = if modifiers.is_empty() {
            key.to_string()
        } else {
            key_from_code(&event.code).unwrap_or_else(|| key.to_string())
        };
        let (platform, cb) = {
            let opts = self.inner.options.borrow();
            (
                opts.platform.unwrap_or_else(detect_platform),
                opts.on_record.clone(),
            )
        };
        let hotkey = format_portable(&ParsedHotkey::new(&key, modifiers), platform);
        self.detach();
        debug!(hotkey = %hotkey, "recorder_recorded");
        self.inner.store.set_state(|s| {
            s.is_recording = false;
            s.recorded_hotkey = Some(hotkey.clone());
        });
        if let Some(cb) = cb {
            cb(&hotkey);
        }
    }
}

impl fmt::Debug for HotkeyRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyRecorder")
            .field("state", &self.inner.store.snapshot())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}
