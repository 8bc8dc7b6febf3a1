use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Global exhibit settings shared by every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhibitSettings {
    /// Serial port of the button console (e.g. "COM3").
    pub port_name: String,
    /// Baud rate of the button console.
    pub baud_rate: u32,
    /// Stage entry/exit fade duration in seconds.
    pub fade_secs: f32,
    /// Seconds without visitor input before returning to the title stage.
    pub inactivity_secs: f32,
    /// Debounce interval sent to the console firmware at startup (ms).
    pub button_delay_ms: u32,
    /// Display indices the exhibit renders to, primary first.
    pub displays: Vec<u32>,
    /// Root directory of images, clips and per-stage JSON.
    pub assets_dir: PathBuf,
    /// Directory for rolling log files; stdout only when absent.
    pub log_dir: Option<PathBuf>,
    /// Show debug logs.
    pub verbose: bool,
}

impl Default for ExhibitSettings {
    fn default() -> Self {
        Self {
            port_name: "COM3".to_string(),
            baud_rate: 9600,
            fade_secs: 1.0,
            inactivity_secs: 90.0,
            button_delay_ms: 200,
            displays: vec![0, 1, 2],
            assets_dir: PathBuf::from("assets"),
            log_dir: None,
            verbose: false,
        }
    }
}

impl ExhibitSettings {
    /// Load settings from disk, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from_file().unwrap_or_default()
    }

    fn load_from_file() -> Result<Self> {
        let path = Self::settings_path()?;
        Self::load_from(&path)
    }

    /// Load settings from a specific path; missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        self.save_to(&path)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn settings_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("kr", "launchpad", "launchpad") {
            Ok(proj_dirs.config_dir().join("settings.json"))
        } else {
            Ok(PathBuf::from(".launchpad-settings.json"))
        }
    }

    /// All configured display indices as overlay slots, primary first.
    pub fn display_slots(&self) -> Vec<usize> {
        (0..self.displays.len()).collect()
    }
}
