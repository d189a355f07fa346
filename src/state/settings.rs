//! User settings model

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    engine::RhythmConfig,
    feedback::CuePreferences,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("invalid value for {key}: {source}")]
    Invalid {
        key: String,
        source: serde_json::Error,
    },
}

/// Persisted user preferences
///
/// Missing fields fall back to the defaults when deserialized, so blobs
/// written by older versions keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub inhale: u32,
    pub hold: u32,
    pub exhale: u32,
    pub rest: u32,
    pub total_cycles: u32,
    pub theme: Theme,
    pub haptics_enabled: bool,
    pub voice_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inhale: 4,
            hold: 4,
            exhale: 4,
            rest: 4,
            total_cycles: 10,
            theme: Theme::Dark,
            haptics_enabled: true,
            voice_enabled: false,
        }
    }
}

impl Settings {
    /// Snapshot of the rhythm part of the settings
    pub fn rhythm(&self) -> RhythmConfig {
        RhythmConfig::new(self.inhale, self.hold, self.exhale, self.rest, self.total_cycles)
    }

    pub fn cue_preferences(&self) -> CuePreferences {
        CuePreferences {
            haptics_enabled: self.haptics_enabled,
            voice_enabled: self.voice_enabled,
        }
    }

    pub fn get(&self, field: SettingField) -> u32 {
        match field {
            SettingField::Inhale => self.inhale,
            SettingField::Hold => self.hold,
            SettingField::Exhale => self.exhale,
            SettingField::Rest => self.rest,
            SettingField::TotalCycles => self.total_cycles,
        }
    }

    fn slot(&mut self, field: SettingField) -> &mut u32 {
        match field {
            SettingField::Inhale => &mut self.inhale,
            SettingField::Hold => &mut self.hold,
            SettingField::Exhale => &mut self.exhale,
            SettingField::Rest => &mut self.rest,
            SettingField::TotalCycles => &mut self.total_cycles,
        }
    }

    /// Step a numeric field, ignoring steps that leave its allowed range
    ///
    /// Returns whether the value changed.
    pub fn adjust(&mut self, field: SettingField, delta: i32) -> bool {
        let (min, max) = field.bounds();
        let next = i64::from(self.get(field)) + i64::from(delta);
        if delta == 0 || next < i64::from(min) || next > i64::from(max) {
            return false;
        }
        // bounded by `max`, so the cast cannot truncate
        *self.slot(field) = next as u32;
        true
    }

    /// Check every rhythm field against the settings panel ranges
    pub fn validate_rhythm(rhythm: &RhythmConfig) -> Result<(), SettingsError> {
        for field in SettingField::ALL {
            field.check(field.of(rhythm))?;
        }
        Ok(())
    }

    /// Overlay one saved field on these settings
    ///
    /// Unknown keys are ignored. A value of the wrong type or outside its
    /// range leaves the current value in place.
    pub fn merge_field(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if let Some(field) = SettingField::ALL.into_iter().find(|f| f.key() == key) {
            let value = decode::<u32>(key, value)?;
            *self.slot(field) = field.check(value)?;
            return Ok(());
        }

        match key {
            "theme" => self.theme = decode(key, value)?,
            "hapticsEnabled" => self.haptics_enabled = decode(key, value)?,
            "voiceEnabled" => self.voice_enabled = decode(key, value)?,
            _ => {}
        }
        Ok(())
    }

    /// Replace all rhythm fields at once
    pub fn set_rhythm(&mut self, rhythm: RhythmConfig) {
        self.inhale = rhythm.inhale;
        self.hold = rhythm.hold;
        self.exhale = rhythm.exhale;
        self.rest = rhythm.rest;
        self.total_cycles = rhythm.total_cycles;
    }
}

/// A numeric setting adjustable from the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingField {
    Inhale,
    Hold,
    Exhale,
    Rest,
    TotalCycles,
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, SettingsError> {
    serde_json::from_value(value).map_err(|source| SettingsError::Invalid {
        key: key.to_string(),
        source,
    })
}

impl SettingField {
    pub const ALL: [SettingField; 5] = [
        SettingField::Inhale,
        SettingField::Hold,
        SettingField::Exhale,
        SettingField::Rest,
        SettingField::TotalCycles,
    ];

    /// Name of the field in the saved blob
    pub fn key(self) -> &'static str {
        match self {
            SettingField::Inhale => "inhale",
            SettingField::Hold => "hold",
            SettingField::Exhale => "exhale",
            SettingField::Rest => "rest",
            SettingField::TotalCycles => "totalCycles",
        }
    }

    fn of(self, rhythm: &RhythmConfig) -> u32 {
        match self {
            SettingField::Inhale => rhythm.inhale,
            SettingField::Hold => rhythm.hold,
            SettingField::Exhale => rhythm.exhale,
            SettingField::Rest => rhythm.rest,
            SettingField::TotalCycles => rhythm.total_cycles,
        }
    }

    pub fn check(self, value: u32) -> Result<u32, SettingsError> {
        let (min, max) = self.bounds();
        if value < min || value > max {
            return Err(SettingsError::OutOfRange {
                key: self.key(),
                value,
                min,
                max,
            });
        }
        Ok(value)
    }

    /// Inclusive range accepted by the settings panel
    pub fn bounds(self) -> (u32, u32) {
        match self {
            SettingField::Inhale | SettingField::Exhale => (1, 20),
            SettingField::Hold | SettingField::Rest => (0, 20),
            SettingField::TotalCycles => (1, 100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_respects_bounds() {
        let mut settings = Settings::default();
        settings.inhale = 1;

        assert!(!settings.adjust(SettingField::Inhale, -1));
        assert_eq!(settings.inhale, 1);

        assert!(settings.adjust(SettingField::Inhale, 1));
        assert_eq!(settings.inhale, 2);

        settings.hold = 0;
        assert!(!settings.adjust(SettingField::Hold, -1));

        settings.total_cycles = 100;
        assert!(!settings.adjust(SettingField::TotalCycles, 1));
        assert!(settings.adjust(SettingField::TotalCycles, -1));
        assert_eq!(settings.total_cycles, 99);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"inhale": 6, "theme": "light"}"#).unwrap();
        assert_eq!(settings.inhale, 6);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.total_cycles, 10);
        assert!(settings.haptics_enabled);
    }

    #[test]
    fn rhythm_outside_panel_ranges_is_rejected() {
        assert!(Settings::validate_rhythm(&RhythmConfig::new(4, 7, 8, 0, 10)).is_ok());
        assert!(Settings::validate_rhythm(&RhythmConfig::new(1, 0, 20, 20, 100)).is_ok());

        let err = Settings::validate_rhythm(&RhythmConfig::new(0, 0, 0, 0, 4_000_000_000)).unwrap_err();
        assert_eq!(err.to_string(), "inhale must be between 1 and 20, got 0");
        assert!(Settings::validate_rhythm(&RhythmConfig::new(4, 21, 8, 0, 10)).is_err());
        assert!(Settings::validate_rhythm(&RhythmConfig::new(4, 4, 4, 4, 101)).is_err());
        assert!(Settings::validate_rhythm(&RhythmConfig::new(4, 4, 4, 4, 0)).is_err());
    }

    #[test]
    fn merge_field_keeps_current_value_on_bad_input() {
        let mut settings = Settings::default();

        assert!(settings.merge_field("theme", serde_json::json!("sepia")).is_err());
        assert!(settings.merge_field("hold", Value::Null).is_err());
        assert!(settings.merge_field("totalCycles", serde_json::json!(500)).is_err());
        assert_eq!(settings, Settings::default());

        settings.merge_field("exhale", serde_json::json!(9)).unwrap();
        settings.merge_field("soundscape", serde_json::json!("rain")).unwrap();
        assert_eq!(settings.exhale, 9);
    }

    #[test]
    fn rhythm_snapshot_is_detached() {
        let mut settings = Settings::default();
        let rhythm = settings.rhythm();
        settings.adjust(SettingField::Inhale, 3);
        assert_eq!(rhythm.inhale, 4);
        assert_eq!(settings.rhythm().inhale, 7);
    }
}
