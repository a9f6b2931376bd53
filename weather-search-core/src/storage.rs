//! Persistence of the last successfully looked-up place.

use anyhow::{Context, Result};
use std::{
    fmt::Debug,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::project_dirs;

/// Key the place is stored under in the settings file.
pub const SAVED_LOCATION_KEY: &str = "saved_location";

/// Single-slot memory of the last place the user looked up.
///
/// Saving is advisory: implementations swallow their own failures.
pub trait LocationStore: Send + Sync + Debug {
    fn save(&self, place: &str);
    fn load(&self) -> Option<String>;
}

/// Stores the place in a TOML settings file, leaving other keys intact.
#[derive(Debug, Clone)]
pub struct FileLocationStore {
    path: PathBuf,
}

impl FileLocationStore {
    /// Store backed by `settings.toml` in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(project_dirs()?.data_dir().join("settings.toml")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<toml::Table> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", self.path.display()))
    }

    pub fn try_load(&self) -> Result<Option<String>> {
        let table = self.read_table()?;
        Ok(table.get(SAVED_LOCATION_KEY).and_then(|v| v.as_str()).map(str::to_owned))
    }

    /// Writes the place, keeping the other keys of a parseable file.
    ///
    /// A file that cannot be read or parsed is replaced by one holding only
    /// the place. The new contents land via a temp file and a rename, so a
    /// failed write never leaves a truncated file behind.
    pub fn try_save(&self, place: &str) -> Result<()> {
        let mut table = self.read_table().unwrap_or_else(|e| {
            warn!(error = %format!("{e:#}"), "replacing unreadable settings file");
            toml::Table::new()
        });
        table.insert(SAVED_LOCATION_KEY.to_string(), toml::Value::String(place.to_string()));
        let contents = toml::to_string(&table).context("Failed to serialize settings")?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create settings directory: {}", parent.display())
        })?;

        let mut tmp = NamedTempFile::new_in(parent).with_context(|| {
            format!("Failed to create temp file in: {}", parent.display())
        })?;
        tmp.write_all(contents.as_bytes()).context("Failed to write settings")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;

        Ok(())
    }
}

impl LocationStore for FileLocationStore {
    fn save(&self, place: &str) {
        match self.try_save(place) {
            Ok(()) => debug!(place, path = %self.path.display(), "saved location"),
            Err(e) => warn!(place, error = %format!("{e:#}"), "could not save location"),
        }
    }

    fn load(&self) -> Option<String> {
        self.try_load().unwrap_or_else(|e| {
            warn!(error = %format!("{e:#}"), "could not load saved location");
            None
        })
    }
}

/// In-memory [`LocationStore`].
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    slot: Mutex<Option<String>>,
    fail_saves: bool,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_saved(place: &str) -> Self {
        Self { slot: Mutex::new(Some(place.to_string())), fail_saves: false }
    }

    /// A store whose saves are silently dropped.
    pub fn failing() -> Self {
        Self { slot: Mutex::new(None), fail_saves: true }
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocationStore for MemoryLocationStore {
    fn save(&self, place: &str) {
        if self.fail_saves {
            warn!(place, "could not save location: store is read-only");
            return;
        }
        *self.slot() = Some(place.to_string());
    }

    fn load(&self) -> Option<String> {
        self.slot().clone()
    }
}
