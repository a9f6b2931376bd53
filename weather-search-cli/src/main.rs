//! Binary crate for the `weather-search` terminal app.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Keystroke input and rendering of the search state

use std::{
    fs::{self, File},
    path::Path,
    sync::Mutex,
};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use weather_search_core::Config;

mod cli;
mod terminal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing();
    cmd.run().await
}

/// Logs go to a file: the search screen owns the terminal.
///
/// Without a writable log file the app runs with no subscriber installed.
fn init_tracing() {
    let Ok(file) = Config::log_file_path().and_then(|path| open_log_file(&path)) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("Failed to create log file: {}", path.display()))
}
