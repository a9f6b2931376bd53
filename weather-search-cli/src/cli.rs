use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_search_core::{Config, FileLocationStore, lookup_from_config};

use crate::terminal;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-search", version, about = "Current weather, searched as you type")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com key in the config file.
    Configure,

    /// Open the search screen (the default).
    Search,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Search) {
            Command::Configure => configure(),
            Command::Search => search().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("WeatherAPI.com key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get a free key at https://www.weatherapi.com/signup.aspx")
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn search() -> anyhow::Result<()> {
    let config = Config::load()?;
    let lookup = lookup_from_config(&config)?;
    let store = Arc::new(FileLocationStore::open_default()?);

    terminal::run(lookup, store, config.search).await
}
