use serde::{Deserialize, Serialize};

use crate::normalize_key_name;

/// Modifier keys, in canonical emission order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modifier {
    Control,
    Alt,
    Shift,
    Meta,
}

/// Operating system family, used to resolve the `Mod` alias.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Mac,
    Windows,
    Linux,
}

impl Platform {
    /// The modifier that `Mod` stands for: Meta (Command) on macOS, Control elsewhere.
    pub fn mod_modifier(self) -> Modifier {
        match self {
            Self::Mac => Modifier::Meta,
            Self::Windows | Self::Linux => Modifier::Control,
        }
    }
}

/// Detect the platform this binary was built for.
pub fn detect_platform() -> Platform {
    if cfg!(target_os = "macos") {
        Platform::Mac
    } else if cfg!(target_os = "windows") {
        Platform::Windows
    } else {
        Platform::Linux
    }
}

impl Modifier {
    /// All modifiers in canonical order.
    pub const ALL: [Self; 4] = [Self::Control, Self::Alt, Self::Shift, Self::Meta];

    /// Parses a modifier specification via key-name normalisation.
    ///
    /// Accepts canonical names and the usual aliases (ctrl, opt, alt, cmd, command,
    /// super, win). `Mod` is not a modifier by itself; it is resolved against a
    /// platform by the hotkey parser.
    pub fn from_spec(s: &str) -> Option<Self> {
        match normalize_key_name(s).as_str() {
            "Control" => Some(Self::Control),
            "Alt" => Some(Self::Alt),
            "Shift" => Some(Self::Shift),
            "Meta" => Some(Self::Meta),
            _ => None,
        }
    }

    /// Returns the canonical spec string for this modifier.
    pub fn to_spec(self) -> &'static str {
        match self {
            Self::Control => "Control",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Meta => "Meta",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_specs() {
        assert_eq!(Modifier::from_spec("ctrl"), Some(Modifier::Control));
        assert_eq!(Modifier::from_spec("opt"), Some(Modifier::Alt));
        assert_eq!(Modifier::from_spec("CMD"), Some(Modifier::Meta));
        assert_eq!(Modifier::from_spec("shift"), Some(Modifier::Shift));
        assert_eq!(Modifier::from_spec("mod"), None);
        assert_eq!(Modifier::from_spec("k"), None);

        for m in Modifier::ALL {
            assert_eq!(Modifier::from_spec(m.to_spec()), Some(m));
        }
    }

    #[test]
    fn mod_alias_per_platform() {
        assert_eq!(Platform::Mac.mod_modifier(), Modifier::Meta);
        assert_eq!(Platform::Windows.mod_modifier(), Modifier::Control);
        assert_eq!(Platform::Linux.mod_modifier(), Modifier::Control);
    }
}
