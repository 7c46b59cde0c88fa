//! One scripted session: bind, play, collect a transcript.

use std::{cell::RefCell, rc::Rc};

use hotkeys_reactive::{
    HotkeyOptions, HotkeysDefaults, KeyboardEvent, Platform, RecorderOptions,
    SequenceBindOptions, bind_hotkey, bind_recorder, bind_sequence, document, held_keys,
    hotkeys_provider,
    signals::{create_effect, create_root},
};
use tracing::debug;

use crate::{
    error::Result,
    script::{Player, Step},
};

/// What to bind before the script runs.
#[derive(Debug, Clone, Default)]
pub struct SessionSetup {
    /// Hotkeys to bind.
    pub binds: Vec<String>,
    /// Sequences, steps separated by whitespace.
    pub sequences: Vec<String>,
    /// Start a recorder before the first step.
    pub record: bool,
    /// Scope defaults for every binding.
    pub defaults: HotkeysDefaults,
    /// Call-site platform; `None` lets the engine detect it.
    pub platform: Option<Platform>,
}

/// Shared transcript sink.
#[derive(Clone, Default)]
struct Transcript {
    /// Lines in emission order.
    lines: Rc<RefCell<Vec<String>>>,
}

impl Transcript {
    fn push(&self, line: String) {
        debug!(line = %line, "transcript");
        self.lines.borrow_mut().push(line);
    }

    fn take(&self) -> Vec<String> {
        self.lines.take()
    }
}

/// Right-aligned event timestamp.
fn stamp(ev: &KeyboardEvent) -> String {
    format!("{:>6}ms", ev.time_stamp.as_millis())
}

/// Create every binding in `setup` inside the current scope.
fn bind_all(setup: &SessionSetup, out: &Transcript) -> Result<()> {
    for hotkey in &setup.binds {
        let out = out.clone();
        bind_hotkey(
            hotkey.as_str(),
            move |ev, ctx| out.push(format!("{} hotkey {}", stamp(ev), ctx.hotkey)),
            HotkeyOptions {
                platform: setup.platform,
                ..HotkeyOptions::default()
            },
        )?;
    }
    for sequence in &setup.sequences {
        let out = out.clone();
        let steps: Vec<String> = sequence.split_whitespace().map(str::to_string).collect();
        bind_sequence(
            steps,
            move |ev, ctx| out.push(format!("{} sequence {}", stamp(ev), ctx.hotkey)),
            SequenceBindOptions {
                platform: setup.platform,
                ..SequenceBindOptions::default()
            },
        )?;
    }
    if setup.record {
        let (on_record, on_cancel, on_clear) = (out.clone(), out.clone(), out.clone());
        let recorder = bind_recorder(RecorderOptions {
            on_record: Some(Rc::new(move |h: &str| on_record.push(format!("recorded {h}")))),
            on_cancel: Some(Rc::new(move || on_cancel.push("recording cancelled".into()))),
            on_clear: Some(Rc::new(move || on_clear.push("recording cleared".into()))),
            platform: setup.platform,
        });
        recorder.start_recording();
    }
    Ok(())
}

/// Bind everything in `setup`, play `steps` against the document and return
/// the transcript. All bindings are released before returning.
pub fn run(setup: &SessionSetup, steps: &[Step]) -> Result<Vec<String>> {
    let out = Transcript::default();
    create_root(|root| {
        let bound = hotkeys_provider(setup.defaults.clone(), || bind_all(setup, &out));
        if let Err(err) = bound {
            root.dispose();
            return Err(err);
        }

        let held = held_keys();
        let held_out = out.clone();
        create_effect(move || {
            let keys = held.get();
            if !keys.is_empty() {
                held_out.push(format!("         held {}", keys.join(" ")));
            }
        });

        let mut player = Player::new();
        for step in steps {
            for ev in player.expand(step) {
                debug!(key = %ev.key, kind = ?ev.kind, at = player.clock(), "dispatch");
                if let Some(doc) = document() {
                    doc.dispatch(&ev);
                }
            }
        }
        root.dispose();
        Ok(out.take())
    })
}
