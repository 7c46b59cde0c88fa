use keyengine::{HotkeyOptions, RecorderOptions};
use keyspec::Platform;
use serde::{Deserialize, Serialize};

use crate::{DefaultsError, error::Result};

/// Options accepted by [`bind_sequence`](crate::bind_sequence).
///
/// Only `timeout_ms` and `platform` reach the engine, and only when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceBindOptions {
    /// Defaults to true.
    pub enabled: Option<bool>,
    /// Maximum gap between steps, in milliseconds.
    pub timeout_ms: Option<u64>,
    pub platform: Option<Platform>,
}

/// Default overlays supplied by a [`hotkeys_provider`](crate::hotkeys_provider) scope.
///
/// Loaded from code or from RON. Callbacks and targets are code-only:
///
/// ```ron
/// (
///     hotkey: (prevent_default: Some(false)),
///     sequence: (timeout_ms: Some(500)),
///     recorder: (platform: Some(Mac)),
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeysDefaults {
    pub hotkey: HotkeyOptions,
    pub sequence: SequenceBindOptions,
    pub recorder: RecorderOptions,
}

impl HotkeysDefaults {
    /// Parse defaults from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| DefaultsError::Parse {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use keyengine::EventKind;

    use super::*;

    #[test]
    fn parses_partial_defaults() {
        let d = HotkeysDefaults::from_ron(
            "(hotkey: (prevent_default: Some(false), event_type: Some(KeyUp)), sequence: (timeout_ms: Some(250)))",
        )
        .expect("parse");
        assert_eq!(d.hotkey.prevent_default, Some(false));
        assert_eq!(d.hotkey.event_type, Some(EventKind::KeyUp));
        assert_eq!(d.hotkey.enabled, None);
        assert_eq!(d.sequence.timeout_ms, Some(250));
        assert_eq!(d.recorder.platform, None);
    }

    #[test]
    fn empty_text_is_empty_defaults() {
        let d = HotkeysDefaults::from_ron("()").expect("parse");
        assert_eq!(d.hotkey, HotkeyOptions::default());
        assert_eq!(d.sequence, SequenceBindOptions::default());
    }

    #[test]
    fn reports_parse_errors() {
        let err = HotkeysDefaults::from_ron("(hotkey: (enabled: maybe))").expect_err("invalid");
        assert!(matches!(err, DefaultsError::Parse { .. }));
    }
}
