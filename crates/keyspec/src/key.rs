// Central table of named keys, spelled the way keyboard events report them.
// Lookup is case-insensitive; emission always uses the spelling listed here.
macro_rules! named_keys {
    ($m:ident, $arg:expr) => {
        $m! { $arg,
            "Escape", "Enter", "Tab", "Space", "Backspace", "Delete", "Insert",
            "Home", "End", "PageUp", "PageDown",
            "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight",
            "CapsLock", "NumLock", "ScrollLock", "ContextMenu", "PrintScreen", "Pause",
            "Control", "Shift", "Alt", "Meta", "AltGraph", "Fn",
        }
    };
}

// Aliases accepted when parsing (not emitted by normalisation).
macro_rules! key_aliases {
    ($m:ident, $arg:expr) => {
        $m! { $arg,
            "esc" => "Escape",
            "return" => "Enter",
            "ret" => "Enter",
            " " => "Space",
            "spacebar" => "Space",
            "del" => "Delete",
            "ins" => "Insert",
            "up" => "ArrowUp",
            "down" => "ArrowDown",
            "left" => "ArrowLeft",
            "right" => "ArrowRight",
            "pgup" => "PageUp",
            "pgdn" => "PageDown",
            "caps" => "CapsLock",
            "menu" => "ContextMenu",

            // modifiers
            "ctrl" => "Control",
            "control" => "Control",
            "opt" => "Alt",
            "option" => "Alt",
            "alt" => "Alt",
            "cmd" => "Meta",
            "command" => "Meta",
            "super" => "Meta",
            "win" => "Meta",
            "os" => "Meta",
        }
    };
}

macro_rules! named_match {
    ( $s:expr, $( $k:expr, )* ) => {{
        let s: &str = $s;
        $( if s.eq_ignore_ascii_case($k) { return Some($k); } )*
        None
    }}
}

macro_rules! alias_match {
    ( $s:expr, $( $a:expr => $k:expr, )* ) => {
        match $s {
            $( $a => Some($k), )*
            _ => None,
        }
    }
}

/// Look up a named key case-insensitively.
fn named(s: &str) -> Option<&'static str> {
    named_keys!(named_match, s)
}

/// Returns the canonical spelling of a key name.
///
/// - Named keys (`Escape`, `ArrowUp`, `Control`, ...) are matched case-insensitively.
/// - Aliases (`esc`, `return`, `ctrl`, `cmd`, `opt`, ...) map to their canonical name.
/// - Function keys are spelled `F1`..`F24`.
/// - A single character is uppercased when it is a letter and kept as-is otherwise.
/// - Anything else is returned unchanged.
pub fn normalize_key_name(key: &str) -> String {
    if key == " " {
        return "Space".to_string();
    }
    let trimmed = key.trim();
    if let Some(k) = named(trimmed) {
        return k.to_string();
    }
    let lowered = trimmed.to_ascii_lowercase();
    if let Some(k) = key_aliases!(alias_match, lowered.as_str()) {
        return k.to_string();
    }
    if let Some(n) = lowered.strip_prefix('f')
        && !n.is_empty()
        && n.chars().all(|c| c.is_ascii_digit())
        && let Ok(num) = n.parse::<u8>()
        && (1..=24).contains(&num)
    {
        return format!("F{num}");
    }
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_uppercase().collect(),
        _ => trimmed.to_string(),
    }
}

/// Returns true when `key` names one of the modifier keys (after normalisation).
pub fn is_modifier_key(key: &str) -> bool {
    matches!(
        normalize_key_name(key).as_str(),
        "Control" | "Shift" | "Alt" | "Meta" | "AltGraph" | "Fn"
    )
}

/// Derive the logical key from a physical `code` value for letters and digits.
///
/// `KeyA` yields `A`, `Digit1` yields `1`. Used when a modifier (e.g. Option on
/// macOS) changes the produced character but not the physical key.
pub fn key_from_code(code: &str) -> Option<String> {
    if let Some(letter) = code.strip_prefix("Key")
        && letter.len() == 1
        && letter.chars().all(|c| c.is_ascii_alphabetic())
    {
        return Some(letter.to_ascii_uppercase());
    }
    if let Some(digit) = code.strip_prefix("Digit")
        && digit.len() == 1
        && digit.chars().all(|c| c.is_ascii_digit())
    {
        return Some(digit.to_string());
    }
    None
}
