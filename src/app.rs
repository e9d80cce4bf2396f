//! Application Coordinator
//!
//! Wires the frame source, the frame processor and the weight display
//! together. Frames are analyzed strictly one at a time on the scanning
//! thread; readings travel over a channel to the display thread, which
//! applies the debounce.

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::capture::FrameSource;
use crate::config::AppConfig;
use crate::display::WeightDisplay;
use crate::overlay::ScanOverlay;
use crate::shared::{ScanRegionSlot, ScannerEvent, ScannerStats};
use crate::vision::{FrameOutcome, FrameProcessor, NumericExtractor, TextRecognizer};

/// Result of a scanning session
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub stats: ScannerStats,
    /// Display state after the last event
    pub display: WeightDisplay,
}

/// Main application coordinator
pub struct ScannerApp {
    config: AppConfig,
    scan_region: ScanRegionSlot,
    overlay: ScanOverlay,
}

impl ScannerApp {
    pub fn new(config: AppConfig) -> Self {
        let scan_region = ScanRegionSlot::new();
        let overlay = ScanOverlay::new(config.overlay.clone(), scan_region.clone());
        Self {
            config,
            scan_region,
            overlay,
        }
    }

    #[cfg(test)]
    pub fn scan_region(&self) -> &ScanRegionSlot {
        &self.scan_region
    }

    /// Scan every frame the source delivers
    ///
    /// `on_update` runs on the display thread after each accepted reading.
    pub fn run<F>(
        &self,
        source: &mut dyn FrameSource,
        recognizer: Box<dyn TextRecognizer>,
        on_update: F,
    ) -> Result<ScanSummary>
    where
        F: FnMut(&WeightDisplay) + Send + 'static,
    {
        let (view_width, view_height) = self.config.overlay.view_size;
        self.overlay.on_layout(view_width, view_height);

        if let Err(e) = source.configure(&self.config.capture) {
            error!("Frame source configuration failed: {:#}", e);
        }

        let processor = FrameProcessor::new(
            recognizer,
            NumericExtractor::new(self.config.scanner.extraction),
            self.scan_region.clone(),
        );

        let (events, display_rx) = unbounded();
        let display_thread = spawn_display(
            display_rx,
            Duration::from_millis(self.config.scanner.debounce_ms),
            on_update,
        )?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let _ = events.send(ScannerEvent::Started);
        let stats = runtime.block_on(async {
            let mut stats = ScannerStats::default();
            loop {
                let pending = match source.next_frame() {
                    Ok(Some(pending)) => pending,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Frame source failed: {:#}", e);
                        break;
                    }
                };
                stats.frames += 1;

                match processor.process(pending).await {
                    FrameOutcome::Reading(reading) => {
                        debug!(
                            "Frame {}: read {:?} (value {:?})",
                            reading.sequence, reading.text, reading.value
                        );
                        stats.readings += 1;
                        let _ = events.send(ScannerEvent::Reading(reading));
                    }
                    FrameOutcome::NoReading => {}
                    FrameOutcome::Skipped(reason) => {
                        debug!("Frame skipped: {:?}", reason);
                        stats.skipped += 1;
                    }
                    FrameOutcome::Failed(reason) => {
                        debug!("Frame failed: {}", reason);
                        stats.failed += 1;
                    }
                }
            }
            stats
        });
        let _ = events.send(ScannerEvent::Stopped);

        let display = display_thread
            .join()
            .map_err(|_| anyhow::anyhow!("Display thread panicked"))?;

        info!(
            "Scan finished: {} frames, {} readings, {} skipped, {} failed",
            stats.frames, stats.readings, stats.skipped, stats.failed
        );

        Ok(ScanSummary { stats, display })
    }
}

/// Run the display model on its own thread until scanning stops
fn spawn_display<F>(
    events: Receiver<ScannerEvent>,
    debounce: Duration,
    mut on_update: F,
) -> Result<JoinHandle<WeightDisplay>>
where
    F: FnMut(&WeightDisplay) + Send + 'static,
{
    let handle = std::thread::Builder::new()
        .name("weight-display".to_string())
        .spawn(move || {
            let mut display = WeightDisplay::new(debounce);
            for event in events {
                match event {
                    ScannerEvent::Started => debug!("Display: scanning started"),
                    ScannerEvent::Reading(reading) => {
                        if display.offer(&reading.text, Instant::now()) {
                            info!("Weight updated: {} (frame {})", reading.text, reading.sequence);
                            on_update(&display);
                        } else {
                            debug!(
                                "Reading {} from frame {} debounced ({:?} after capture)",
                                reading.text,
                                reading.sequence,
                                reading.captured_at.elapsed()
                            );
                        }
                    }
                    ScannerEvent::Stopped => {
                        display.stop_scanning();
                        break;
                    }
                }
            }
            display
        })?;
    Ok(handle)
}
