use std::{cell::RefCell, fmt, rc::Rc};

use keyengine::{HotkeyRecorder, RecorderOptions, RecorderState, Store, Unsubscribe};
use signals::{ReadSignal, WriteSignal, create_effect, create_signal, on_cleanup};
use tracing::trace;

use crate::{MaybeAccessor, resolve_recorder, use_default_hotkeys_options};

/// The recorder and its store subscription, alive until the owning scope is
/// disposed.
#[derive(Default)]
struct RecorderSlot {
    recorder: Option<HotkeyRecorder>,
    subscription: Option<Unsubscribe>,
}

/// Reactive view of a [`HotkeyRecorder`], returned by [`bind_recorder`].
///
/// Controls are no-ops once the owning scope has been disposed.
#[derive(Clone)]
pub struct HotkeyRecorderBinding {
    is_recording: ReadSignal<bool>,
    recorded_hotkey: ReadSignal<Option<String>>,
    slot: Rc<RefCell<RecorderSlot>>,
}

impl HotkeyRecorderBinding {
    /// Whether recording is active. Tracked.
    pub fn is_recording(&self) -> bool {
        self.is_recording.get()
    }

    /// The last recorded hotkey. Tracked.
    pub fn recorded_hotkey(&self) -> Option<String> {
        self.recorded_hotkey.get()
    }

    pub fn is_recording_signal(&self) -> ReadSignal<bool> {
        self.is_recording.clone()
    }

    pub fn recorded_hotkey_signal(&self) -> ReadSignal<Option<String>> {
        self.recorded_hotkey.clone()
    }

    pub fn start_recording(&self) {
        if let Some(r) = self.recorder() {
            r.start();
        }
    }

    /// Stop recording without calling the cancel callback.
    pub fn stop_recording(&self) {
        if let Some(r) = self.recorder() {
            r.stop();
        }
    }

    /// Stop recording and call the cancel callback.
    pub fn cancel_recording(&self) {
        if let Some(r) = self.recorder() {
            r.cancel();
        }
    }

    fn recorder(&self) -> Option<HotkeyRecorder> {
        let r = self.slot.borrow().recorder.clone();
        if r.is_none() {
            trace!("recorder_control_after_dispose");
        }
        r
    }
}

impl fmt::Debug for HotkeyRecorderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyRecorderBinding")
            .field("is_recording", &self.is_recording.get_untracked())
            .field("recorded_hotkey", &self.recorded_hotkey.get_untracked())
            .finish_non_exhaustive()
    }
}

/// Copy the recorder state into the two signals.
fn push_state(
    store: &Store<RecorderState>,
    is_recording: &WriteSignal<bool>,
    recorded: &WriteSignal<Option<String>>,
) {
    let state = store.snapshot();
    is_recording.set_if_changed(state.is_recording);
    recorded.set_if_changed(state.recorded_hotkey);
}

/// Create a recorder owned by the current scope.
///
/// The recorder is built on the first run and reused afterwards: option
/// changes are applied with `set_options`, so recording state survives them.
/// Disposing the scope unsubscribes from the recorder, then destroys it.
pub fn bind_recorder(options: impl Into<MaybeAccessor<RecorderOptions>>) -> HotkeyRecorderBinding {
    let options = options.into();
    let defaults = use_default_hotkeys_options().recorder;
    let (is_recording, set_recording) = create_signal(false);
    let (recorded_hotkey, set_recorded) = create_signal(None::<String>);
    let slot = Rc::new(RefCell::new(RecorderSlot::default()));

    let teardown = slot.clone();
    on_cleanup(move || {
        let RecorderSlot {
            recorder,
            subscription,
        } = teardown.take();
        if let Some(unsub) = subscription {
            unsub.unsubscribe();
        }
        if let Some(r) = recorder {
            r.destroy();
        }
    });

    let effect_slot = slot.clone();
    create_effect(move || {
        let merged = resolve_recorder(&defaults, options.get());
        let existing = effect_slot.borrow().recorder.clone();
        let recorder = match existing {
            Some(r) => r,
            None => {
                let r = HotkeyRecorder::new(merged.clone());
                let store = r.store();
                let subscription = {
                    let (store, set_recording, set_recorded) =
                        (store.clone(), set_recording.clone(), set_recorded.clone());
                    store
                        .clone()
                        .subscribe(move || push_state(&store, &set_recording, &set_recorded))
                };
                push_state(&store, &set_recording, &set_recorded);
                *effect_slot.borrow_mut() = RecorderSlot {
                    recorder: Some(r.clone()),
                    subscription: Some(subscription),
                };
                r
            }
        };
        recorder.set_options(merged);
    });

    HotkeyRecorderBinding {
        is_recording,
        recorded_hotkey,
        slot,
    }
}
