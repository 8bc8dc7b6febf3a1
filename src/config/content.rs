use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Placement of a piece of content on its display, in canvas pixels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
}

/// A text block sourced from per-stage JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSetting {
    pub text: String,
    pub font_size: f32,
    /// RGBA, each channel in [0,1].
    pub color: [f32; 4],
    pub position: Placement,
}

impl Default for TextSetting {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 32.0,
            color: [1.0, 1.0, 1.0, 1.0],
            position: Placement::default(),
        }
    }
}

/// A still image sourced from per-stage JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSetting {
    /// File name under the assets directory.
    pub source_image: String,
    pub width: f32,
    pub height: f32,
    pub position: Placement,
    /// RGBA tint, each channel in [0,1].
    pub color: [f32; 4],
}

impl Default for ImageSetting {
    fn default() -> Self {
        Self {
            source_image: String::new(),
            width: 0.0,
            height: 0.0,
            position: Placement::default(),
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// A playable clip sourced from per-stage JSON.
///
/// Decode is outside this program; the declared duration drives playback
/// progress, so it must match the encoded clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSetting {
    /// File name under the assets directory.
    pub file_name: String,
    pub duration_secs: f32,
    pub volume: f32,
    pub width: f32,
    pub height: f32,
    pub position: Placement,
}

impl Default for MediaSetting {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            duration_secs: 0.0,
            volume: 1.0,
            width: 0.0,
            height: 0.0,
            position: Placement::default(),
        }
    }
}

/// Load a stage's settings struct from `<assets_dir>/JSON/<file>`.
pub fn load_stage_settings<T: DeserializeOwned>(assets_dir: &Path, file: &str) -> Result<T> {
    let path = assets_dir.join("JSON").join(file);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read stage settings {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse stage settings {}", path.display()))
}
