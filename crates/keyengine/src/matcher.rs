use keyspec::{Modifier, ParsedHotkey, key_from_code, normalize_key_name};

use crate::KeyboardEvent;

/// True when the event's key (or, for letters and digits, its physical code)
/// names the hotkey's key.
pub fn key_matches(hotkey: &ParsedHotkey, event: &KeyboardEvent) -> bool {
    if normalize_key_name(&event.key).eq_ignore_ascii_case(&hotkey.key) {
        return true;
    }
    key_from_code(&event.code).is_some_and(|k| k.eq_ignore_ascii_case(&hotkey.key))
}

/// True when `event` satisfies `hotkey`: the key matches and the modifier flags
/// are exactly the hotkey's modifiers. For a modifier-only hotkey ("Shift") the
/// flag of the key itself is ignored.
pub fn matches_event(hotkey: &ParsedHotkey, event: &KeyboardEvent) -> bool {
    if !key_matches(hotkey, event) {
        return false;
    }
    Modifier::ALL
        .into_iter()
        .filter(|m| m.to_spec() != hotkey.key)
        .all(|m| hotkey.has(m) == event.has_modifier(m))
}

#[cfg(test)]
mod tests {
    use keyspec::{Platform, parse_hotkey};

    use super::*;

    fn hk(s: &str) -> ParsedHotkey {
        parse_hotkey(s, Platform::Linux).expect("parse")
    }

    #[test]
    fn exact_modifiers() {
        let h = hk("Shift+A");
        assert!(matches_event(&h, &KeyboardEvent::key_down("a").with_modifier(Modifier::Shift)));
        assert!(!matches_event(&h, &KeyboardEvent::key_down("a")));
        assert!(!matches_event(
            &h,
            &KeyboardEvent::key_down("a")
                .with_modifier(Modifier::Shift)
                .with_modifier(Modifier::Control)
        ));
    }

    #[test]
    fn case_and_alias_insensitive_keys() {
        assert!(matches_event(&hk("esc"), &KeyboardEvent::key_down("Escape")));
        assert!(matches_event(&hk("Enter"), &KeyboardEvent::key_down("enter")));
        assert!(!matches_event(&hk("Escape"), &KeyboardEvent::key_down("Enter")));
    }

    #[test]
    fn physical_code_fallback() {
        let h = hk("Alt+S");
        let ev = KeyboardEvent::key_down("ß")
            .with_code("KeyS")
            .with_modifier(Modifier::Alt);
        assert!(matches_event(&h, &ev));
    }

    #[test]
    fn modifier_only_hotkey_ignores_own_flag() {
        let h = hk("Shift");
        let ev = KeyboardEvent::key_down("Shift").with_modifier(Modifier::Shift);
        assert!(matches_event(&h, &ev));
        assert!(matches_event(&h, &KeyboardEvent::key_down("Shift")));
    }
}
