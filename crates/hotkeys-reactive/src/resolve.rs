//! Configuration resolution: literal-or-accessor inputs and layered overlays.
//!
//! Everything here is pure and is evaluated on every controller run.

use std::{fmt, rc::Rc, time::Duration};

use keyengine::{EventTarget, HotkeyOptions, RecorderOptions, SequenceOptions, document};
use keyspec::{
    Platform, RawHotkey, RegisterableHotkey, detect_platform, format_hotkey, raw_hotkey_to_parsed,
};
use signals::{Memo, ReadSignal};

use crate::SequenceBindOptions;

/// A value given either directly or as a producer that is re-evaluated (and
/// tracked) on every controller run.
pub enum MaybeAccessor<T> {
    Static(T),
    Dynamic(Rc<dyn Fn() -> T>),
}

impl<T: Clone> MaybeAccessor<T> {
    /// Wrap a producer closure.
    pub fn from_fn(f: impl Fn() -> T + 'static) -> Self {
        Self::Dynamic(Rc::new(f))
    }

    /// The current value. Calling a producer inside an effect tracks its reads.
    pub fn get(&self) -> T {
        match self {
            Self::Static(v) => v.clone(),
            Self::Dynamic(f) => f(),
        }
    }
}

impl<T> Clone for MaybeAccessor<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Self::Static(v) => Self::Static(v.clone()),
            Self::Dynamic(f) => Self::Dynamic(f.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MaybeAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<T: Default> Default for MaybeAccessor<T> {
    fn default() -> Self {
        Self::Static(T::default())
    }
}

impl<T> From<T> for MaybeAccessor<T> {
    fn from(v: T) -> Self {
        Self::Static(v)
    }
}

impl<T: Clone + 'static> From<ReadSignal<T>> for MaybeAccessor<T> {
    fn from(s: ReadSignal<T>) -> Self {
        Self::Dynamic(Rc::new(move || s.get()))
    }
}

impl<T: Clone + 'static> From<Memo<T>> for MaybeAccessor<T> {
    fn from(m: Memo<T>) -> Self {
        Self::Dynamic(Rc::new(move || m.get()))
    }
}

impl From<&str> for MaybeAccessor<String> {
    fn from(s: &str) -> Self {
        Self::Static(s.to_string())
    }
}

impl From<&str> for MaybeAccessor<RegisterableHotkey> {
    fn from(s: &str) -> Self {
        Self::Static(s.into())
    }
}

impl From<String> for MaybeAccessor<RegisterableHotkey> {
    fn from(s: String) -> Self {
        Self::Static(s.into())
    }
}

impl From<RawHotkey> for MaybeAccessor<RegisterableHotkey> {
    fn from(raw: RawHotkey) -> Self {
        Self::Static(raw.into())
    }
}

impl From<ReadSignal<String>> for MaybeAccessor<RegisterableHotkey> {
    fn from(s: ReadSignal<String>) -> Self {
        Self::Dynamic(Rc::new(move || s.get().into()))
    }
}

impl From<&[&str]> for MaybeAccessor<Vec<String>> {
    fn from(steps: &[&str]) -> Self {
        Self::Static(steps.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for MaybeAccessor<Vec<String>> {
    fn from(steps: [&str; N]) -> Self {
        Self::Static(steps.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Key-by-key shallow merge. Keys present in `over` win; absent keys fall
/// through to `self`.
pub trait Overlay: Sized {
    /// Apply `over` on top of `self`.
    fn overlay(self, over: Self) -> Self;
}

fn merge<T: Overlay + Clone>(defaults: &T, call_site: T) -> T {
    defaults.clone().overlay(call_site)
}

impl Overlay for HotkeyOptions {
    fn overlay(self, over: Self) -> Self {
        Self::overlay(self, over)
    }
}

impl Overlay for RecorderOptions {
    fn overlay(self, over: Self) -> Self {
        Self::overlay(self, over)
    }
}

impl Overlay for SequenceBindOptions {
    fn overlay(self, over: Self) -> Self {
        Self {
            enabled: over.enabled.or(self.enabled),
            timeout_ms: over.timeout_ms.or(self.timeout_ms),
            platform: over.platform.or(self.platform),
        }
    }
}

/// A hotkey ready for registration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHotkey {
    /// Normalised hotkey string.
    pub hotkey: String,
    /// Merged options with the target removed.
    pub options: HotkeyOptions,
    /// Explicit target, else the document, else none.
    pub target: Option<EventTarget>,
}

/// String hotkeys pass through; structured descriptors are formatted against
/// `platform`, or the detected platform.
pub fn normalize_hotkey(spec: &RegisterableHotkey, platform: Option<Platform>) -> String {
    match spec {
        RegisterableHotkey::Hotkey(s) => s.clone(),
        RegisterableHotkey::Raw(raw) => format_hotkey(&raw_hotkey_to_parsed(
            raw,
            platform.unwrap_or_else(detect_platform),
        )),
    }
}

/// Merge scope defaults with call-site options and normalise the hotkey.
pub fn resolve_hotkey(
    defaults: &HotkeyOptions,
    call_site: HotkeyOptions,
    spec: &RegisterableHotkey,
) -> ResolvedHotkey {
    let mut options = merge(defaults, call_site);
    let hotkey = normalize_hotkey(spec, options.platform);
    let target = options.target.take().or_else(document);
    ResolvedHotkey {
        hotkey,
        options,
        target,
    }
}

/// A sequence registration decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSequence {
    pub enabled: bool,
    /// Options for the engine; absent keys stay absent.
    pub options: SequenceOptions,
}

/// Merge scope defaults with call-site options for a sequence.
pub fn resolve_sequence(
    defaults: &SequenceBindOptions,
    call_site: SequenceBindOptions,
) -> ResolvedSequence {
    let merged = merge(defaults, call_site);
    ResolvedSequence {
        enabled: merged.enabled.unwrap_or(true),
        options: SequenceOptions {
            enabled: true,
            timeout: merged.timeout_ms.map(Duration::from_millis),
            platform: merged.platform,
        },
    }
}

/// Merge scope defaults with call-site options for a recorder.
pub fn resolve_recorder(defaults: &RecorderOptions, call_site: RecorderOptions) -> RecorderOptions {
    merge(defaults, call_site)
}

#[cfg(test)]
mod tests {
    use keyengine::{EventKind, set_document};
    use signals::{create_effect, create_root, create_signal};

    use super::*;

    #[test]
    fn call_site_wins_key_by_key() {
        let defaults = HotkeyOptions {
            prevent_default: Some(false),
            event_type: Some(EventKind::KeyUp),
            ..HotkeyOptions::default()
        };
        let call = HotkeyOptions {
            prevent_default: Some(true),
            ..HotkeyOptions::default()
        };
        let r = resolve_hotkey(&defaults, call, &"Mod+S".into());
        assert_eq!(r.options.prevent_default, Some(true));
        assert_eq!(r.options.event_type, Some(EventKind::KeyUp));
        assert_eq!(r.options.stop_propagation, None);
        assert_eq!(r.hotkey, "Mod+S");
    }

    #[test]
    fn target_resolution() {
        let el = EventTarget::root("panel");
        let r = resolve_hotkey(
            &HotkeyOptions::default(),
            HotkeyOptions {
                target: Some(el.clone()),
                ..HotkeyOptions::default()
            },
            &"K".into(),
        );
        assert_eq!(r.target, Some(el));
        assert_eq!(r.options.target, None);

        let r = resolve_hotkey(&HotkeyOptions::default(), HotkeyOptions::default(), &"K".into());
        assert_eq!(r.target, document());

        let prev = set_document(None);
        let r = resolve_hotkey(&HotkeyOptions::default(), HotkeyOptions::default(), &"K".into());
        assert_eq!(r.target, None);
        set_document(prev);
    }

    #[test]
    fn raw_descriptors_use_merged_platform() {
        let raw = RawHotkey {
            key: "s".into(),
            mod_key: true,
            ..RawHotkey::default()
        };
        let defaults = HotkeyOptions {
            platform: Some(Platform::Mac),
            ..HotkeyOptions::default()
        };
        let r = resolve_hotkey(&defaults, HotkeyOptions::default(), &raw.clone().into());
        assert_eq!(r.hotkey, "Meta+S");
        assert_eq!(normalize_hotkey(&raw.into(), Some(Platform::Windows)), "Control+S");
    }

    #[test]
    fn sequence_forwards_only_present_keys() {
        let r = resolve_sequence(&SequenceBindOptions::default(), SequenceBindOptions::default());
        assert!(r.enabled);
        assert_eq!(r.options.timeout, None);
        assert_eq!(r.options.platform, None);

        let defaults = SequenceBindOptions {
            timeout_ms: Some(300),
            enabled: Some(false),
            ..SequenceBindOptions::default()
        };
        let r = resolve_sequence(
            &defaults,
            SequenceBindOptions {
                enabled: Some(true),
                ..SequenceBindOptions::default()
            },
        );
        assert!(r.enabled);
        assert_eq!(r.options.timeout, Some(Duration::from_millis(300)));
    }

    #[test]
    fn accessors_are_tracked() {
        create_root(|root| {
            let (key, set_key) = create_signal(String::from("Escape"));
            let spec: MaybeAccessor<RegisterableHotkey> = key.into();
            let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
            let s = seen.clone();
            create_effect(move || s.borrow_mut().push(normalize_hotkey(&spec.get(), None)));
            set_key.set("Enter".into());
            assert_eq!(*seen.borrow(), vec!["Escape", "Enter"]);
            root.dispose();
        });
    }
}
