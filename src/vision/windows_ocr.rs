//! Windows OCR API backend
//!
//! Uses the built-in Windows OCR (Media.Ocr). Frames are rotated upright
//! before recognition and line boxes are mapped back to sensor coordinates.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use windows::{
    core::HSTRING,
    Globalization::Language,
    Graphics::Imaging::{BitmapPixelFormat, SoftwareBitmap},
    Media::Ocr::{OcrEngine as WinOcrEngine, OcrResult as WinOcrResult},
    Storage::Streams::DataWriter,
};

use super::region::upright_to_sensor;
use super::{FrameImage, PixelRect, RecognitionError, RecognizedText, TextBlock, TextRecognizer};

/// Windows OCR engine wrapper
pub struct WindowsOcr {
    engine: WinOcrEngine,
    language: String,
}

impl WindowsOcr {
    /// Create a new Windows OCR engine with the specified language
    pub fn new(language_tag: &str) -> Result<Self> {
        info!("Initializing Windows OCR engine with language: {}", language_tag);

        let language = Language::CreateLanguage(&HSTRING::from(language_tag))
            .context("Failed to create language")?;

        if !WinOcrEngine::IsLanguageSupported(&language)
            .context("Failed to check language support")?
        {
            warn!("Language '{}' not supported, falling back to user profile languages", language_tag);
            let engine = WinOcrEngine::TryCreateFromUserProfileLanguages()
                .context("Failed to create OCR engine from user profile")?;
            let language = engine
                .RecognizerLanguage()
                .and_then(|l| l.LanguageTag())
                .context("Failed to get recognizer language")?
                .to_string();

            info!("Windows OCR initialized with language: {}", language);
            return Ok(Self { engine, language });
        }

        let engine = WinOcrEngine::TryCreateFromLanguage(&language)
            .context("Failed to create OCR engine for language")?;

        Ok(Self {
            engine,
            language: language_tag.to_string(),
        })
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    fn recognize_upright(&self, image: &FrameImage<'_>) -> Result<RecognizedText> {
        let upright = image
            .upright()
            .ok_or_else(|| anyhow::anyhow!("Image buffer does not match {}x{}", image.width, image.height))?;
        let (width, height) = upright.dimensions();
        debug!("Windows OCR: processing {}x{} upright image", width, height);

        let bgra = rgba_to_bgra(upright.as_raw());
        let bitmap = create_software_bitmap(&bgra, width, height)?;

        // Blocks until recognition completes
        let result: WinOcrResult = self
            .engine
            .RecognizeAsync(&bitmap)
            .context("Failed to start OCR recognition")?
            .get()
            .context("OCR recognition failed")?;

        let mut blocks = Vec::new();
        let lines = result.Lines().context("Failed to get OCR lines")?;
        for line in lines {
            let text = line.Text().context("Failed to get line text")?.to_string();
            let bounds = line_bounds(&line)
                .map(|b| upright_to_sensor(&b, image.width, image.height, image.rotation));
            blocks.push(TextBlock { text, bounds });
        }

        debug!("Windows OCR: found {} lines", blocks.len());
        Ok(RecognizedText::new(blocks))
    }
}

#[async_trait]
impl TextRecognizer for WindowsOcr {
    fn name(&self) -> &str {
        "windows_ocr"
    }

    async fn recognize(&self, image: FrameImage<'_>) -> Result<RecognizedText, RecognitionError> {
        if image.data.is_empty() || image.width == 0 || image.height == 0 {
            return Err(RecognitionError::EmptyImage);
        }
        self.recognize_upright(&image)
            .map_err(|e| RecognitionError::Backend(format!("{:#}", e)))
    }
}

/// Union of the word boxes of a line, in upright image coordinates
fn line_bounds(line: &windows::Media::Ocr::OcrLine) -> Option<PixelRect> {
    let words = line.Words().ok()?;
    let mut bounds: Option<PixelRect> = None;
    for word in words {
        let Ok(rect) = word.BoundingRect() else {
            continue;
        };
        let word_rect = PixelRect::new(
            rect.X as i32,
            rect.Y as i32,
            (rect.X + rect.Width) as i32,
            (rect.Y + rect.Height) as i32,
        );
        bounds = Some(match bounds {
            None => word_rect,
            Some(b) => PixelRect::new(
                b.left.min(word_rect.left),
                b.top.min(word_rect.top),
                b.right.max(word_rect.right),
                b.bottom.max(word_rect.bottom),
            ),
        });
    }
    bounds
}

/// Convert RGBA to BGRA (Windows expects BGRA)
fn rgba_to_bgra(rgba: &[u8]) -> Vec<u8> {
    let mut bgra = rgba.to_vec();
    for chunk in bgra.chunks_exact_mut(4) {
        chunk.swap(0, 2); // Swap R and B
    }
    bgra
}

/// Create a SoftwareBitmap from BGRA data
fn create_software_bitmap(bgra_data: &[u8], width: u32, height: u32) -> Result<SoftwareBitmap> {
    let writer = DataWriter::new().context("Failed to create data writer")?;
    writer
        .WriteBytes(bgra_data)
        .context("Failed to write pixel data")?;
    let buffer = writer.DetachBuffer().context("Failed to detach buffer")?;

    let bitmap = SoftwareBitmap::Create(BitmapPixelFormat::Bgra8, width as i32, height as i32)
        .context("Failed to create SoftwareBitmap")?;
    bitmap
        .CopyFromBuffer(&buffer)
        .context("Failed to copy buffer to bitmap")?;

    Ok(bitmap)
}
