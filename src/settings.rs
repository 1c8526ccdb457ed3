//! Game settings and preferences
//!
//! Stored as JSON next to the binary (or wherever `--settings` points).
//! Missing or malformed files fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::Transition;
use crate::consts::RESTART_TRANSITION_SECS;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    // === Runs ===
    /// Seed of the first run; later runs derive from it
    pub seed: u64,
    /// Scene change played on restart (`null` for a hard cut)
    pub restart_transition: Option<Transition>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            // Background track sits quietly under the effects
            music_volume: 0.1,
            muted: false,

            seed: 0x5EED,
            restart_transition: Some(Transition::Doorway {
                duration: RESTART_TRANSITION_SECS,
            }),
        }
    }
}

impl Settings {
    /// Parse settings JSON; unknown fields are ignored, missing ones defaulted
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Using default settings ({}: {})", path.display(), err);
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Ignoring malformed settings in {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
