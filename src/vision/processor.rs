//! Per-frame analysis
//!
//! Each frame goes through: scan region lookup, rotation-aware mapping into
//! sensor space, OCR, block filtering and numeric extraction. The frame is
//! owned by [`FrameProcessor::process`] and released when it returns, on
//! every path.

use std::time::Instant;
use tracing::{debug, warn};

use crate::capture::frame::{CameraFrame, PendingFrame};
use crate::shared::ScanRegionSlot;

use super::extract::NumericExtractor;
use super::region::{blocks_in_region, map_to_sensor};
use super::TextRecognizer;

/// A reading extracted from one frame
#[derive(Debug, Clone, PartialEq)]
pub struct WeightReading {
    /// Sequence number of the source frame
    pub sequence: u64,
    /// Reading exactly as displayed
    pub text: String,
    /// Parsed value
    pub value: Option<f64>,
    /// When the source frame was captured
    pub captured_at: Instant,
}

/// Why a frame was dropped without OCR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The frame carried no image data
    NoImage,
    /// The overlay has not published a usable scan region yet
    NoScanRegion,
}

/// What happened to a frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A reading was found inside the scan region
    Reading(WeightReading),
    /// OCR ran but nothing inside the scan region qualified
    NoReading,
    /// The frame was dropped before OCR
    Skipped(SkipReason),
    /// OCR failed; the next frame is the retry
    Failed(String),
}

/// Runs OCR on frames and extracts weight readings from the scan region
pub struct FrameProcessor {
    recognizer: Box<dyn TextRecognizer>,
    extractor: NumericExtractor,
    scan_region: ScanRegionSlot,
}

impl FrameProcessor {
    pub fn new(
        recognizer: Box<dyn TextRecognizer>,
        extractor: NumericExtractor,
        scan_region: ScanRegionSlot,
    ) -> Self {
        Self {
            recognizer,
            extractor,
            scan_region,
        }
    }

    /// Slot the overlay publishes scan regions into
    #[cfg(test)]
    pub fn scan_region(&self) -> &ScanRegionSlot {
        &self.scan_region
    }

    /// Analyze one frame, releasing it before returning
    pub async fn process(&self, pending: PendingFrame) -> FrameOutcome {
        let outcome = self.analyze(pending.frame()).await;
        pending.release();
        outcome
    }

    async fn analyze(&self, frame: &CameraFrame) -> FrameOutcome {
        let Some(image) = frame.image() else {
            debug!("Frame {}: no image data, skipping", frame.sequence);
            return FrameOutcome::Skipped(SkipReason::NoImage);
        };

        let Some(region) = self.scan_region.get().filter(|r| !r.is_empty()) else {
            debug!("Frame {}: no scan region yet, skipping", frame.sequence);
            return FrameOutcome::Skipped(SkipReason::NoScanRegion);
        };

        let crop = map_to_sensor(&region, &frame.geometry(), frame.rotation);
        debug!(
            "Frame {} ({}): scan region {:?} -> sensor {:?}",
            frame.sequence, frame.rotation, region, crop
        );

        let start = Instant::now();
        let recognized = match self.recognizer.recognize(image).await {
            Ok(recognized) => recognized,
            Err(e) => {
                warn!("Text recognition failed on frame {}: {}", frame.sequence, e);
                return FrameOutcome::Failed(e.to_string());
            }
        };
        debug!(
            "{} OCR complete in {:?}, all detected text: {:?}",
            self.recognizer.name(),
            start.elapsed(),
            recognized.full_text()
        );

        let filtered = blocks_in_region(&recognized.blocks, &crop)
            .into_iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        debug!("Filtered text: {:?}", filtered);

        match self.extractor.extract_candidate(&filtered) {
            Some(candidate) => {
                debug!("Extracted weight: {:?}", candidate.raw);
                FrameOutcome::Reading(WeightReading {
                    sequence: frame.sequence,
                    text: candidate.raw,
                    value: candidate.value,
                    captured_at: frame.timestamp,
                })
            }
            None => FrameOutcome::NoReading,
        }
    }
}
