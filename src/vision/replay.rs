//! Replay backend
//!
//! Plays back OCR output recorded from a real engine, one frame per call.
//! The file is a JSON array with one entry per frame; each entry is an array
//! of `{ "text": ..., "bounds": { "left", "top", "right", "bottom" } }` blocks.

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info};

use super::{FrameImage, RecognitionError, RecognizedText, TextRecognizer};

/// Recognizer that returns recorded results in order
pub struct ReplayRecognizer {
    frames: Vec<RecognizedText>,
    cursor: Mutex<usize>,
    looping: bool,
}

impl ReplayRecognizer {
    pub fn new(frames: Vec<RecognizedText>, looping: bool) -> Self {
        Self {
            frames,
            cursor: Mutex::new(0),
            looping,
        }
    }

    /// Load recorded results from a JSON file
    pub fn load(path: &Path, looping: bool) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read OCR recording {:?}", path))?;
        let frames: Vec<RecognizedText> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse OCR recording {:?}", path))?;

        let replay = Self::new(frames, looping);
        info!("Loaded {} recorded OCR frames from {:?}", replay.len(), path);
        Ok(replay)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl TextRecognizer for ReplayRecognizer {
    fn name(&self) -> &str {
        "replay"
    }

    async fn recognize(&self, image: FrameImage<'_>) -> Result<RecognizedText, RecognitionError> {
        if image.data.is_empty() {
            return Err(RecognitionError::EmptyImage);
        }

        let mut cursor = self.cursor.lock();
        if *cursor >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Err(RecognitionError::Exhausted);
            }
            *cursor = 0;
        }

        let result = self.frames[*cursor].clone();
        debug!(
            "Replaying recorded frame {} ({} blocks) for {}x{} image at {}",
            *cursor,
            result.blocks.len(),
            image.width,
            image.height,
            image.rotation
        );
        *cursor += 1;
        Ok(result)
    }
}
