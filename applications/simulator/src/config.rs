/// Simulator configuration
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tagplay_control::ControlConfig;
use tagplay_core::types::MAX_FOLDER;
use tagplay_core::Announcements;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "tagplay.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub announcements: Announcements,

    /// Folders on the simulated SD card
    #[serde(default)]
    pub folders: Vec<FolderSpec>,

    /// How long every folder track plays
    #[serde(default = "default_track_ms")]
    pub track_ms: u64,

    #[serde(default = "default_eeprom_size")]
    pub eeprom_size: usize,

    /// Random seed; drawn from the OS when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

/// One folder and its number of tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FolderSpec {
    pub folder: u8,
    pub tracks: u16,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            control: ControlConfig::default(),
            announcements: Announcements::default(),
            folders: Vec::new(),
            track_ms: default_track_ms(),
            eeprom_size: default_eeprom_size(),
            seed: None,
        }
    }
}

impl SimConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `tagplay.toml` is used if
    /// present. Environment variables prefixed `TAGPLAY_` override both,
    /// with `__` separating nested keys (`TAGPLAY_CONTROL__MAX_WAIT_MS`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(SimError::Config(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TAGPLAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| SimError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| SimError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.track_ms == 0 {
            return Err(SimError::Config("track_ms must be positive".to_string()));
        }
        if self.control.poll_interval_ms == 0 {
            return Err(SimError::Config(
                "control.poll_interval_ms must be positive".to_string(),
            ));
        }
        for spec in &self.folders {
            if spec.folder == 0 || spec.folder > MAX_FOLDER {
                return Err(SimError::Config(format!(
                    "folder {} outside 1..={}",
                    spec.folder, MAX_FOLDER
                )));
            }
        }
        Ok(())
    }
}

fn default_track_ms() -> u64 {
    3_000
}

fn default_eeprom_size() -> usize {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.control, ControlConfig::default());
    }

    #[test]
    fn rejects_folder_zero() {
        let config = SimConfig {
            folders: vec![FolderSpec {
                folder: 0,
                tracks: 3,
            }],
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = SimConfig::load(Some(Path::new("/nonexistent/tagplay.toml")));
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}
