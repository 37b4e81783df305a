//! Cross-session player preferences. Only the music base volume is persisted.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize preferences")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Resource, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AudioPreferences {
    #[serde(default = "default_music_volume")]
    pub music_base_volume: f32,
}

fn default_music_volume() -> f32 {
    0.8
}

impl Default for AudioPreferences {
    fn default() -> Self {
        Self {
            music_base_volume: default_music_volume(),
        }
    }
}

/// Where the preference file lives: `ENCOUNTER_PREFS` or `preferences.json`.
pub fn preferences_path() -> PathBuf {
    std::env::var("ENCOUNTER_PREFS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("preferences.json"))
}

impl AudioPreferences {
    /// `Ok(None)` when no preference has been saved yet.
    pub fn load(path: &Path) -> Result<Option<Self>, PreferencesError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|source| PreferencesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut prefs: Self =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        prefs.music_base_volume = prefs.music_base_volume.clamp(0.0, 1.0);
        Ok(Some(prefs))
    }

    /// Falls back to `fallback_volume` when the file is missing or unreadable.
    pub fn load_or_default(path: &Path, fallback_volume: f32) -> Self {
        match Self::load(path) {
            Ok(Some(prefs)) => {
                info!(
                    "[Encounter] Music volume {:.2} restored from {}",
                    prefs.music_base_volume,
                    path.display()
                );
                prefs
            }
            Ok(None) => Self {
                music_base_volume: fallback_volume.clamp(0.0, 1.0),
            },
            Err(e) => {
                warn!("[Encounter] {e}; using default music volume");
                Self {
                    music_base_volume: fallback_volume.clamp(0.0, 1.0),
                }
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PreferencesError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PreferencesError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| PreferencesError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("encounter_prefs_{}_{}", std::process::id(), name))
            .join("preferences.json")
    }

    #[test]
    fn round_trips_through_disk() {
        let path = scratch("round_trip");
        let prefs = AudioPreferences {
            music_base_volume: 0.45,
        };
        prefs.save(&path).expect("save");
        let loaded = AudioPreferences::load(&path).expect("load").expect("present");
        assert_eq!(loaded, prefs);
        let _ = std::fs::remove_dir_all(path.parent().unwrap_or(&path));
    }

    #[test]
    fn missing_file_uses_fallback() {
        let path = scratch("missing");
        assert!(AudioPreferences::load(&path).expect("no error").is_none());
        let prefs = AudioPreferences::load_or_default(&path, 0.6);
        assert_eq!(prefs.music_base_volume, 0.6);
    }

    #[test]
    fn corrupt_file_reports_parse_error() {
        let path = scratch("corrupt");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "{ not json").expect("write");
        let err = AudioPreferences::load(&path).expect_err("should fail");
        assert!(matches!(err, PreferencesError::Parse { .. }));
        assert_eq!(AudioPreferences::load_or_default(&path, 0.8).music_base_volume, 0.8);
        let _ = std::fs::remove_dir_all(path.parent().unwrap_or(&path));
    }

    #[test]
    fn out_of_range_volume_is_clamped() {
        let path = scratch("clamp");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, r#"{ "music_base_volume": 4.0 }"#).expect("write");
        let loaded = AudioPreferences::load(&path).expect("load").expect("present");
        assert_eq!(loaded.music_base_volume, 1.0);
        let _ = std::fs::remove_dir_all(path.parent().unwrap_or(&path));
    }
}
