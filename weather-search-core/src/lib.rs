//! Core library for the `weather-search` app.
//!
//! This crate defines:
//! - The search orchestrator (debounced input, superseded lookups)
//! - The weather lookup port and its WeatherAPI.com adapter
//! - The single-slot memory of the last looked-up place
//! - Configuration & shared domain models
//!
//! It is used by `weather-search-cli`, but any front end that can forward
//! text edits and render a [`DisplayView`] can drive it.

pub mod config;
pub mod error;
pub mod lookup;
pub mod mapper;
pub mod model;
pub mod orchestrator;
pub mod storage;

pub use config::{Config, SearchSettings};
pub use error::{LookupError, OrchestratorError};
pub use lookup::{WeatherLookup, lookup_from_config};
pub use model::{DisplayView, SearchState, WeatherSnapshot};
pub use orchestrator::{OrchestratorHandle, SearchOrchestrator};
pub use storage::{FileLocationStore, LocationStore, MemoryLocationStore};
