use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Modifier, Platform, Result, is_modifier_key, normalize_key_name};

/// A hotkey: a set of modifiers plus a single key.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ParsedHotkey {
    /// Canonical key name (see [`normalize_key_name`]).
    pub key: String,
    /// Modifiers that must be held, ordered canonically.
    pub modifiers: BTreeSet<Modifier>,
}

impl ParsedHotkey {
    /// Build a hotkey from a key and modifiers; the key is normalised.
    pub fn new(key: &str, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        Self {
            key: normalize_key_name(key),
            modifiers: modifiers.into_iter().collect(),
        }
    }

    /// True when `m` is part of this hotkey.
    pub fn has(&self, m: Modifier) -> bool {
        self.modifiers.contains(&m)
    }

    /// True when the key itself is a modifier (e.g. "Shift" on its own).
    pub fn is_modifier_only(&self) -> bool {
        is_modifier_key(&self.key)
    }
}

impl fmt::Display for ParsedHotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_hotkey(self))
    }
}

/// Structured hotkey descriptor.
///
/// `mod_key` stands for the platform's primary modifier (Meta on macOS, Control
/// elsewhere) and is resolved by [`raw_hotkey_to_parsed`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RawHotkey {
    /// Key name, in any spelling accepted by [`normalize_key_name`].
    pub key: String,
    /// Platform primary modifier.
    #[serde(rename = "mod")]
    pub mod_key: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl RawHotkey {
    /// A descriptor for `key` with no modifiers.
    pub fn key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }
}

/// Anything a registration API accepts as a hotkey.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum RegisterableHotkey {
    /// A hotkey string such as `Mod+S`.
    Hotkey(String),
    /// A structured descriptor.
    Raw(RawHotkey),
}

impl From<&str> for RegisterableHotkey {
    fn from(s: &str) -> Self {
        Self::Hotkey(s.to_string())
    }
}

impl From<String> for RegisterableHotkey {
    fn from(s: String) -> Self {
        Self::Hotkey(s)
    }
}

impl From<RawHotkey> for RegisterableHotkey {
    fn from(raw: RawHotkey) -> Self {
        Self::Raw(raw)
    }
}

/// Parses a hotkey string of the form "Control+Shift+S".
///
/// - Components are separated by `+`; the last component is the key. A literal
///   `+` key is written as a trailing `++` (e.g. "Control++").
/// - Modifiers accept aliases (ctrl, opt, alt, cmd, ...). `Mod` resolves to the
///   platform's primary modifier.
/// - Matching of names is case-insensitive; the result is normalised.
pub fn parse_hotkey(spec: &str, platform: Platform) -> Result<ParsedHotkey> {
    if spec.trim().is_empty() {
        return Err(Error::Empty);
    }
    let (mods_part, key_raw) = if spec == "+" {
        ("", "+")
    } else if let Some(head) = spec.strip_suffix("++") {
        (head, "+")
    } else {
        match spec.rsplit_once('+') {
            Some((head, key)) => (head, key),
            None => ("", spec),
        }
    };
    if key_raw.trim().is_empty() && key_raw != " " {
        return Err(Error::EmptyComponent {
            spec: spec.to_string(),
        });
    }

    let mut modifiers = BTreeSet::new();
    if !mods_part.is_empty() {
        for token in mods_part.split('+') {
            let token = token.trim();
            if token.is_empty() {
                return Err(Error::EmptyComponent {
                    spec: spec.to_string(),
                });
            }
            let m = if token.eq_ignore_ascii_case("mod") {
                platform.mod_modifier()
            } else {
                Modifier::from_spec(token).ok_or_else(|| Error::UnknownModifier {
                    spec: spec.to_string(),
                    token: token.to_string(),
                })?
            };
            modifiers.insert(m);
        }
    }
    Ok(ParsedHotkey {
        key: normalize_key_name(key_raw),
        modifiers,
    })
}

/// Returns the canonical string form: modifiers in Control, Alt, Shift, Meta
/// order followed by the key, joined with `+`.
pub fn format_hotkey(hotkey: &ParsedHotkey) -> String {
    let mut out: Vec<&str> = hotkey.modifiers.iter().map(|m| m.to_spec()).collect();
    out.push(&hotkey.key);
    out.join("+")
}

/// Like [`format_hotkey`], but writes the platform's primary modifier as `Mod`
/// so the result is portable across platforms.
pub fn format_portable(hotkey: &ParsedHotkey, platform: Platform) -> String {
    let primary = platform.mod_modifier();
    let mut out: Vec<&str> = Vec::with_capacity(hotkey.modifiers.len() + 1);
    if hotkey.has(primary) {
        out.push("Mod");
    }
    out.extend(
        hotkey
            .modifiers
            .iter()
            .filter(|m| **m != primary)
            .map(|m| m.to_spec()),
    );
    out.push(&hotkey.key);
    out.join("+")
}

/// Resolve a structured descriptor against a platform.
pub fn raw_hotkey_to_parsed(raw: &RawHotkey, platform: Platform) -> ParsedHotkey {
    let mut modifiers = BTreeSet::new();
    if raw.mod_key {
        modifiers.insert(platform.mod_modifier());
    }
    for (on, m) in [
        (raw.ctrl, Modifier::Control),
        (raw.alt, Modifier::Alt),
        (raw.shift, Modifier::Shift),
        (raw.meta, Modifier::Meta),
    ] {
        if on {
            modifiers.insert(m);
        }
    }
    ParsedHotkey {
        key: normalize_key_name(&raw.key),
        modifiers,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse_basic() {
        let h = parse_hotkey("shift+ctrl+k", Platform::Linux).expect("parse");
        assert!(h.has(Modifier::Shift));
        assert!(h.has(Modifier::Control));
        assert_eq!(h.key, "K");
        assert_eq!(h.to_string(), "Control+Shift+K");
    }

    #[test]
    fn mod_resolves_per_platform() {
        let mac = parse_hotkey("Mod+S", Platform::Mac).expect("parse");
        assert_eq!(format_hotkey(&mac), "Meta+S");
        let win = parse_hotkey("Mod+S", Platform::Windows).expect("parse");
        assert_eq!(format_hotkey(&win), "Control+S");
    }

    #[test]
    fn plus_key_and_named_keys() {
        let h = parse_hotkey("Control++", Platform::Linux).expect("parse");
        assert_eq!(h.key, "+");
        assert_eq!(parse_hotkey("+", Platform::Linux).expect("parse").key, "+");
        assert_eq!(
            parse_hotkey("esc", Platform::Linux).expect("parse").key,
            "Escape"
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse_hotkey("  ", Platform::Linux), Err(Error::Empty));
        assert!(matches!(
            parse_hotkey("Control+", Platform::Linux),
            Err(Error::EmptyComponent { .. })
        ));
        assert!(matches!(
            parse_hotkey("Hyper+K", Platform::Linux),
            Err(Error::UnknownModifier { token, .. }) if token == "Hyper"
        ));
    }

    #[test]
    fn portable_format() {
        let h = parse_hotkey("Meta+Shift+P", Platform::Mac).expect("parse");
        assert_eq!(format_portable(&h, Platform::Mac), "Mod+Shift+P");
        assert_eq!(format_portable(&h, Platform::Linux), "Shift+Meta+P");
    }

    #[test]
    fn raw_descriptors() {
        let raw = RawHotkey {
            key: "s".into(),
            mod_key: true,
            shift: true,
            ..RawHotkey::default()
        };
        assert_eq!(
            format_hotkey(&raw_hotkey_to_parsed(&raw, Platform::Mac)),
            "Shift+Meta+S"
        );
        assert_eq!(
            format_hotkey(&raw_hotkey_to_parsed(&raw, Platform::Linux)),
            "Control+Shift+S"
        );
    }

    proptest! {
        #[test]
        fn canonical_form_is_a_fixed_point(
            key in "[a-z]|F[1-9]|Escape|Enter|Tab|ArrowUp",
            ctrl: bool, alt: bool, shift: bool, meta: bool,
        ) {
            let mods = [(ctrl, "ctrl"), (alt, "opt"), (shift, "shift"), (meta, "cmd")];
            let mut spec: Vec<&str> = mods.iter().filter(|(on, _)| *on).map(|(_, s)| *s).collect();
            spec.push(&key);
            let parsed = parse_hotkey(&spec.join("+"), Platform::Linux).expect("parse");
            let canonical = format_hotkey(&parsed);
            let reparsed = parse_hotkey(&canonical, Platform::Linux).expect("reparse");
            prop_assert_eq!(&parsed, &reparsed);
            prop_assert_eq!(format_hotkey(&reparsed), canonical);
        }
    }
}
