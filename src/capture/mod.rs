//! Frame Capture Layer
//!
//! Camera frames reach the scanner through the [`FrameSource`] trait. The
//! platform camera stays outside this crate; [`ImageDirSource`] stands in for
//! it by replaying still images from a directory.

pub mod frame;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::CaptureSettings;
use crate::vision::Rotation;

use self::frame::{CameraFrame, PendingFrame};

/// Image file extensions the directory source picks up
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Camera capability: delivers frames one at a time
pub trait FrameSource {
    /// Apply capture settings (rotation, analysis size, ...)
    fn configure(&mut self, settings: &CaptureSettings) -> Result<()>;

    /// Next frame, or None when the source is exhausted
    ///
    /// A source may refuse to deliver while the previous frame is unreleased.
    fn next_frame(&mut self) -> Result<Option<PendingFrame>>;
}

/// Frame source backed by image files in a directory, in name order
pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    rotation: Rotation,
    analysis_size: Option<(u32, u32)>,
    in_flight: Arc<AtomicBool>,
}

impl ImageDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            next: 0,
            rotation: Rotation::Deg0,
            analysis_size: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of frames found by the last `configure`
    pub fn len(&self) -> usize {
        self.files.len()
    }

    fn load_frame(&self, path: &Path, sequence: u64) -> Result<CameraFrame> {
        let image = image::open(path)
            .with_context(|| format!("Failed to decode frame {:?}", path))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let (frame_width, frame_height) = self.analysis_size.unwrap_or((width, height));

        Ok(
            CameraFrame::new(sequence, image.into_raw(), frame_width, frame_height, self.rotation)
                .with_sensor_size(width, height),
        )
    }
}

impl FrameSource for ImageDirSource {
    fn configure(&mut self, settings: &CaptureSettings) -> Result<()> {
        self.rotation = settings.rotation;
        self.analysis_size = settings.analysis_size;
        self.files = list_images(&self.dir)?;
        self.next = 0;

        if self.files.is_empty() {
            anyhow::bail!("No image frames found in {:?}", self.dir);
        }

        info!(
            "Frame source ready: {} frames from {:?}, rotation {}",
            self.len(),
            self.dir,
            self.rotation
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<PendingFrame>> {
        if self.in_flight.load(Ordering::SeqCst) {
            anyhow::bail!("Previous frame has not been released");
        }
        let Some(path) = self.files.get(self.next).cloned() else {
            return Ok(None);
        };
        self.next += 1;

        let sequence = self.next as u64;
        let frame = match self.load_frame(&path, sequence) {
            Ok(frame) => frame,
            Err(e) => {
                // Undecodable frames arrive without image data
                warn!("{:#}", e);
                CameraFrame::without_image(sequence, self.rotation)
            }
        };
        debug!("Delivering frame {} from {:?}", frame.sequence, path);

        self.in_flight.store(true, Ordering::SeqCst);
        let in_flight = self.in_flight.clone();
        Ok(Some(PendingFrame::new(frame).on_release(move |_| {
            in_flight.store(false, Ordering::SeqCst);
        })))
    }
}

/// Image files in a directory, sorted by name
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read frame directory {:?}", dir))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    files.sort();
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
