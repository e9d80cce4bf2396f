//! Vision/OCR Layer
//!
//! Turns camera frames into weight readings. The OCR engine itself sits
//! behind [`TextRecognizer`]; this layer owns what happens around it:
//! - Rotation-aware mapping of the scan region into sensor space
//! - Filtering recognized blocks against that region
//! - Extracting the displayed number from the surviving text
//!
//! Supported OCR backends:
//! - Replay of recorded OCR output (any platform)
//! - Windows OCR API (Windows only)

pub mod extract;
pub mod processor;
pub mod region;
pub mod replay;
#[cfg(windows)]
pub mod windows_ocr;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::OcrSettings;

pub use extract::{ExtractionPolicy, NumericExtractor};
pub use processor::{FrameOutcome, FrameProcessor, WeightReading};
pub use region::{FrameGeometry, PixelRect, Rotation, ScanRegion};
pub use replay::ReplayRecognizer;

/// OCR backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// Recorded OCR output played back frame by frame
    #[default]
    Replay,
    /// Windows built-in OCR
    WindowsOcr,
}

/// One block of recognized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Recognized text, possibly spanning several lines
    pub text: String,
    /// Bounding box in sensor coordinates, when the engine reports one
    #[serde(default)]
    pub bounds: Option<PixelRect>,
}

/// Everything the OCR engine recognized in one frame, in engine order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecognizedText {
    pub blocks: Vec<TextBlock>,
}

impl RecognizedText {
    #[cfg(any(test, windows))]
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self { blocks }
    }

    /// All block texts joined by newlines
    pub fn full_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Image handed to the OCR engine
#[derive(Debug, Clone, Copy)]
pub struct FrameImage<'a> {
    /// Raw RGBA pixel data in sensor orientation
    pub data: &'a [u8],
    /// Sensor buffer width in pixels
    pub width: u32,
    /// Sensor buffer height in pixels
    pub height: u32,
    /// Rotation the engine should apply to read the text upright
    pub rotation: Rotation,
}

#[cfg(any(test, windows))]
impl FrameImage<'_> {
    /// The image rotated so text reads upright; None if the buffer does not match its size
    pub fn upright(&self) -> Option<image::RgbaImage> {
        use image::imageops;

        let sensor = image::RgbaImage::from_raw(self.width, self.height, self.data.to_vec())?;
        Some(match self.rotation {
            Rotation::Deg0 => sensor,
            Rotation::Deg90 => imageops::rotate90(&sensor),
            Rotation::Deg180 => imageops::rotate180(&sensor),
            Rotation::Deg270 => imageops::rotate270(&sensor),
        })
    }
}

/// Failure reported by an OCR backend
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("image buffer is empty")]
    EmptyImage,
    #[error("no recorded OCR results left to replay")]
    Exhausted,
    #[cfg(any(test, windows))]
    #[error("OCR backend error: {0}")]
    Backend(String),
}

/// Asynchronous text recognizer capability
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Recognize text in a frame image
    async fn recognize(&self, image: FrameImage<'_>) -> Result<RecognizedText, RecognitionError>;
}

/// Create the recognizer configured in settings
pub fn create_recognizer(settings: &OcrSettings) -> Result<Box<dyn TextRecognizer>> {
    info!("Initializing {:?} OCR backend", settings.backend);
    match settings.backend {
        OcrBackend::Replay => {
            let path = settings
                .replay_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Replay backend requires ocr.replay_path"))?;
            let recognizer = ReplayRecognizer::load(path, settings.replay_loop)?;
            Ok(Box::new(recognizer))
        }
        #[cfg(windows)]
        OcrBackend::WindowsOcr => {
            let recognizer = windows_ocr::WindowsOcr::new(&settings.language)?;
            info!("Windows OCR ready ({})", recognizer.language());
            Ok(Box::new(recognizer))
        }
        #[cfg(not(windows))]
        OcrBackend::WindowsOcr => anyhow::bail!("Windows OCR is only available on Windows"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_text_joins_blocks() {
        let text = RecognizedText::new(vec![
            TextBlock {
                text: "12.5".to_string(),
                bounds: None,
            },
            TextBlock {
                text: "kg".to_string(),
                bounds: Some(PixelRect::new(0, 0, 5, 5)),
            },
        ]);
        assert_eq!(text.full_text(), "12.5\nkg");
        assert_eq!(text.blocks.len(), 2);
        assert_eq!(RecognizedText::default().full_text(), "");
    }

    #[test]
    fn test_recognized_text_json_shape() {
        let json = r#"[{"text": "88.8", "bounds": {"left": 1, "top": 2, "right": 3, "bottom": 4}}, {"text": "kg"}]"#;
        let parsed: RecognizedText = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.blocks.len(), 2);
        assert_eq!(parsed.blocks[0].bounds, Some(PixelRect::new(1, 2, 3, 4)));
        assert_eq!(parsed.blocks[1].bounds, None);
    }

    #[test]
    fn test_upright_rotates_sensor_image() {
        // 2x1 sensor image: red then blue
        let data = [255, 0, 0, 255, 0, 0, 255, 255];
        let image = FrameImage {
            data: &data,
            width: 2,
            height: 1,
            rotation: Rotation::Deg90,
        };

        let upright = image.upright().unwrap();

        assert_eq!(upright.dimensions(), (1, 2));
        assert_eq!(upright.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(upright.get_pixel(0, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_upright_rejects_short_buffer() {
        let data = [0u8; 7];
        let image = FrameImage {
            data: &data,
            width: 2,
            height: 1,
            rotation: Rotation::Deg0,
        };
        assert!(image.upright().is_none());
    }

    #[test]
    fn test_windows_backend_requires_windows() {
        if cfg!(windows) {
            return;
        }
        let settings = OcrSettings {
            backend: OcrBackend::WindowsOcr,
            ..Default::default()
        };
        assert!(create_recognizer(&settings).is_err());
    }

    #[test]
    fn test_replay_backend_requires_path() {
        let settings = OcrSettings {
            backend: OcrBackend::Replay,
            replay_path: None,
            ..Default::default()
        };
        assert!(create_recognizer(&settings).is_err());
    }
}
