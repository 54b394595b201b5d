//! Single-value key/value persistence for the last displayed location.

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::PathBuf,
    sync::Mutex,
};

use crate::config::project_dirs;

/// Key under which the last successful query is stored.
pub const LAST_SEARCHED_WEATHER_KEY: &str = "last_searched_weather";

pub trait Preferences: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// String map stored as TOML in the platform data directory.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferences {
    /// Opens `preferences.toml` in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(project_dirs()?.data_dir().join("preferences.toml"))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse preferences file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values: Mutex::new(values) })
    }
}

impl Preferences for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());

        // The in-memory map only changes once the file holds the new value.
        let mut updated = values.clone();
        updated.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string(&updated).context("Failed to serialize preferences to TOML")?;
        fs::write(&self.path, toml).with_context(|| {
            format!("Failed to write preferences file: {}", self.path.display())
        })?;

        *values = updated;
        Ok(())
    }
}

/// In-process map; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
