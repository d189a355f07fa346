//! Settings persistence over a key-value backend

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::settings::{SettingField, Settings, Theme};
use crate::{engine::RhythmConfig, feedback::CuePreferences};

/// Fixed key the settings blob is stored under
pub const SETTINGS_KEY: &str = "muhurtoSettings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode stored data: {0}")]
    Serde(#[from] serde_json::Error),
}

/// String key-value persistence
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-process store, lost on exit
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `value` under `key`
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.into());
        Self { entries }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object file mapping keys to strings
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        let encoded = serde_json::to_string_pretty(&entries)?;

        // Write beside the target and rename so a crash never leaves half a file
        let tmp = self.path.with_extension("tmp");
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, encoded).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

/// Loads, mutates and persists the user's settings
pub struct SettingsStore {
    backend: Box<dyn KeyValueStore>,
    settings: Settings,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Load saved settings merged over the defaults
    ///
    /// Unreadable or corrupt data is logged and replaced by the defaults.
    pub fn load(backend: impl KeyValueStore + 'static) -> Self {
        let settings = match backend.get(SETTINGS_KEY) {
            Ok(Some(raw)) => match merge_over_defaults(&raw) {
                Ok(settings) => {
                    info!("Loaded saved settings");
                    settings
                }
                Err(e) => {
                    error!("Could not parse saved settings, using defaults: {}", e);
                    Settings::default()
                }
            },
            Ok(None) => {
                debug!("No saved settings found, using defaults");
                Settings::default()
            }
            Err(e) => {
                error!("Could not load saved settings, using defaults: {}", e);
                Settings::default()
            }
        };

        Self {
            backend: Box::new(backend),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rhythm(&self) -> RhythmConfig {
        self.settings.rhythm()
    }

    pub fn cue_preferences(&self) -> CuePreferences {
        self.settings.cue_preferences()
    }

    /// Write the current settings to the backend
    pub fn save(&mut self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&self.settings)?;
        self.backend.set(SETTINGS_KEY, encoded)
    }

    /// Step a numeric setting; out-of-range steps are ignored
    pub fn adjust(&mut self, field: SettingField, delta: i32) -> bool {
        let changed = self.settings.adjust(field, delta);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.persist();
    }

    /// Flip haptics and return the new value
    pub fn toggle_haptics(&mut self) -> bool {
        self.settings.haptics_enabled = !self.settings.haptics_enabled;
        self.persist();
        self.settings.haptics_enabled
    }

    /// Flip voice guidance and return the new value
    pub fn toggle_voice(&mut self) -> bool {
        self.settings.voice_enabled = !self.settings.voice_enabled;
        self.persist();
        self.settings.voice_enabled
    }

    /// Replace the rhythm fields, e.g. with an AI recommendation
    pub fn apply_rhythm(&mut self, rhythm: RhythmConfig) {
        if let Err(e) = self.try_apply_rhythm(rhythm) {
            error!("Could not save settings: {}", e);
        }
    }

    /// Like [`apply_rhythm`](Self::apply_rhythm), but reports a failed save
    pub fn try_apply_rhythm(&mut self, rhythm: RhythmConfig) -> Result<(), StoreError> {
        self.settings.set_rhythm(rhythm);
        self.save()
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            error!("Could not save settings: {}", e);
        }
    }
}

/// Overlay the saved object on the defaults, key by key
///
/// A field that fails to decode keeps its default; the rest still load.
fn merge_over_defaults(raw: &str) -> Result<Settings, serde_json::Error> {
    let saved: Map<String, Value> = serde_json::from_str(raw)?;
    let mut settings = Settings::default();

    for (key, value) in saved {
        if let Err(e) = settings.merge_field(&key, value) {
            warn!("Ignoring saved setting, keeping default: {}", e);
        }
    }

    Ok(settings)
}
