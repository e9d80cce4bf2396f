//! Frame data structures for camera frames awaiting analysis

use std::fmt;
use std::time::Instant;

use crate::vision::{FrameGeometry, FrameImage, Rotation};

/// A frame delivered by the camera layer
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Monotonic frame number assigned by the source
    pub sequence: u64,
    /// Raw RGBA pixel data in sensor orientation, if the frame carries any
    pub data: Option<Vec<u8>>,
    /// Analysis frame width (view-aligned)
    pub width: u32,
    /// Analysis frame height (view-aligned)
    pub height: u32,
    /// Sensor buffer width in pixels
    pub sensor_width: u32,
    /// Sensor buffer height in pixels
    pub sensor_height: u32,
    /// Rotation needed to display the sensor image upright
    pub rotation: Rotation,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl CameraFrame {
    /// Create a frame whose sensor buffer matches the analysis dimensions
    pub fn new(sequence: u64, data: Vec<u8>, width: u32, height: u32, rotation: Rotation) -> Self {
        Self {
            sequence,
            data: Some(data),
            width,
            height,
            sensor_width: width,
            sensor_height: height,
            rotation,
            timestamp: Instant::now(),
        }
    }

    /// A frame that arrived without image data
    pub fn without_image(sequence: u64, rotation: Rotation) -> Self {
        Self {
            sequence,
            data: None,
            width: 0,
            height: 0,
            sensor_width: 0,
            sensor_height: 0,
            rotation,
            timestamp: Instant::now(),
        }
    }

    /// Override the sensor buffer dimensions
    pub fn with_sensor_size(mut self, width: u32, height: u32) -> Self {
        self.sensor_width = width;
        self.sensor_height = height;
        self
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(
            (self.width, self.height),
            (self.sensor_width, self.sensor_height),
        )
    }

    /// Image view for the OCR engine; None when there is nothing to read
    pub fn image(&self) -> Option<FrameImage<'_>> {
        let data = self.data.as_deref().filter(|d| !d.is_empty())?;
        Some(FrameImage {
            data,
            width: self.sensor_width,
            height: self.sensor_height,
            rotation: self.rotation,
        })
    }
}

type ReleaseHook = Box<dyn FnOnce(u64) + Send + Sync>;

/// A frame on loan from the camera layer
///
/// The source does not deliver the next frame until this one is released.
/// The release hook runs exactly once: on [`PendingFrame::release`] or on drop.
pub struct PendingFrame {
    frame: CameraFrame,
    on_release: Option<ReleaseHook>,
}

impl PendingFrame {
    pub fn new(frame: CameraFrame) -> Self {
        Self {
            frame,
            on_release: None,
        }
    }

    /// Attach a hook called with the frame sequence number on release
    pub fn on_release(mut self, hook: impl FnOnce(u64) + Send + Sync + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn frame(&self) -> &CameraFrame {
        &self.frame
    }

    /// Hand the buffer back to the source
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook(self.frame.sequence);
        }
    }
}

impl Drop for PendingFrame {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for PendingFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFrame")
            .field("sequence", &self.frame.sequence)
            .field("dimensions", &self.frame.dimensions())
            .field("rotation", &self.frame.rotation)
            .field("released", &self.on_release.is_none())
            .finish()
    }
}
