//! State management module
//! 
//! This module contains all state-related structures and their management logic.

pub mod app_state;
pub mod session_state;
pub mod settings;
pub mod settings_store;

// Re-export main types
pub use app_state::AppState;
pub use session_state::{SessionPhase, SessionState};
pub use settings::{SettingField, Settings, SettingsError, Theme};
pub use settings_store::{FileStore, KeyValueStore, MemoryStore, SettingsStore, StoreError, SETTINGS_KEY};
