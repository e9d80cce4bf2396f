//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vision::{ExtractionPolicy, OcrBackend, Rotation};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Reading extraction and display settings
    pub scanner: ScannerSettings,
    /// Scan box layout
    pub overlay: OverlaySettings,
    /// Frame source settings
    pub capture: CaptureSettings,
    /// OCR backend settings
    pub ocr: OcrSettings,
}

/// Reading extraction and display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Minimum time between accepted display updates
    pub debounce_ms: u64,
    /// How strictly numbers are validated
    pub extraction: ExtractionPolicy,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            extraction: ExtractionPolicy::Lenient,
        }
    }
}

/// Scan box layout within the camera preview
///
/// Fractions are relative to the preview after the inset is removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Preview size the scan box is laid out in (width, height)
    pub view_size: (f32, f32),
    /// Padding between the preview edge and the layout area
    pub inset: f32,
    pub left_fraction: f32,
    pub top_fraction: f32,
    pub width_fraction: f32,
    pub height_fraction: f32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            view_size: (480.0, 640.0),
            inset: 32.0,
            left_fraction: 0.15,
            top_fraction: 0.4,
            width_fraction: 0.7,
            height_fraction: 0.15,
        }
    }
}

/// Frame source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Directory of still frames to scan
    pub frames_dir: Option<PathBuf>,
    /// Sensor rotation in degrees (0, 90, 180 or 270)
    pub rotation: Rotation,
    /// Analysis frame size when it differs from the sensor buffer
    pub analysis_size: Option<(u32, u32)>,
}

/// OCR backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Which engine recognizes text
    pub backend: OcrBackend,
    /// Recognition language (Windows OCR), e.g. "en-US"
    pub language: String,
    /// Recorded OCR output for the replay backend
    pub replay_path: Option<PathBuf>,
    /// Start over when the recording runs out
    pub replay_loop: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Replay,
            language: "en-US".to_string(),
            replay_path: None,
            replay_loop: false,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig =
        toml::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
