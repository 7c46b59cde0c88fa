#![warn(missing_docs)]

//! Entry point for the `keytrace` binary.
//!
//! Binds the requested hotkeys, sequences and recorder inside one reactive
//! scope, plays an event script against the document and prints what fired.

mod cli;
mod error;
mod script;
mod session;

use std::{fs, process};

use clap::Parser;
use hotkeys_reactive::{HotkeysDefaults, keyspec::detect_platform};
use tracing::error;

use crate::{
    cli::Cli,
    error::Result,
    session::SessionSetup,
};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and run the session.
fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let defaults = match &cli.defaults {
        Some(path) => HotkeysDefaults::from_ron(&fs::read_to_string(path)?)?,
        None => HotkeysDefaults::default(),
    };
    let text = match &cli.script_file {
        Some(path) => fs::read_to_string(path)?,
        None => cli.script.join(" "),
    };
    let steps = script::parse_script(&text, cli.platform.unwrap_or_else(detect_platform))?;

    let setup = SessionSetup {
        binds: cli.binds,
        sequences: cli.sequences,
        record: cli.record,
        defaults,
        platform: cli.platform,
    };
    for line in session::run(&setup, &steps)? {
        println!("{line}");
    }
    Ok(())
}
