//! Command-line interface definitions for keytrace.

use std::path::PathBuf;

use clap::Parser;
use hotkeys_reactive::Platform;
use logging::LogArgs;

/// Command-line interface for the `keytrace` binary.
#[derive(Parser, Debug)]
#[command(
    name = "keytrace",
    about = "Drive a scripted keyboard session through hotkey bindings",
    version
)]
pub struct Cli {
    /// Logging controls shared across workspace binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Hotkey to bind, e.g. `Mod+S`. Repeatable.
    #[arg(long = "bind", value_name = "HOTKEY")]
    pub binds: Vec<String>,

    /// Key sequence to bind, steps separated by spaces, e.g. `"G G"`. Repeatable.
    #[arg(long = "sequence", value_name = "STEPS")]
    pub sequences: Vec<String>,

    /// Start a recorder before the script runs.
    #[arg(long)]
    pub record: bool,

    /// Scope defaults in RON, e.g. `(hotkey: (require_reset: Some(true)))`.
    #[arg(long, value_name = "PATH")]
    pub defaults: Option<PathBuf>,

    /// Platform used to resolve `Mod` (mac, windows, linux). Defaults to the host.
    #[arg(long, value_parser = parse_platform)]
    pub platform: Option<Platform>,

    /// Read the script from a file instead of the positional arguments.
    #[arg(long, value_name = "PATH", conflicts_with = "script")]
    pub script_file: Option<PathBuf>,

    /// Script steps: `Mod+S` taps a chord, `+Shift`/`^Shift` press/release,
    /// `*J` auto-repeats, `~300` advances the clock by 300ms.
    #[arg(value_name = "STEP")]
    pub script: Vec<String>,
}

/// Parse a platform name, case-insensitively.
fn parse_platform(s: &str) -> Result<Platform, String> {
    match s.to_ascii_lowercase().as_str() {
        "mac" | "macos" => Ok(Platform::Mac),
        "windows" | "win" => Ok(Platform::Windows),
        "linux" => Ok(Platform::Linux),
        other => Err(format!("unknown platform {other:?}")),
    }
}
