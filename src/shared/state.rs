//! State shared between the overlay layout and the frame processor

use parking_lot::RwLock;
use std::sync::Arc;

use crate::vision::ScanRegion;

/// Latest scan region published by the overlay layout
///
/// Written whenever the overlay is laid out, read once per frame.
#[derive(Debug, Clone, Default)]
pub struct ScanRegionSlot {
    inner: Arc<RwLock<Option<ScanRegion>>>,
}

impl ScanRegionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new region
    pub fn set(&self, region: ScanRegion) {
        *self.inner.write() = Some(region);
    }

    /// Forget the region, e.g. when the view goes away
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Current region, if one has been established
    pub fn get(&self) -> Option<ScanRegion> {
        *self.inner.read()
    }
}

/// Counters for a scanning session (not persisted)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScannerStats {
    /// Frames pulled from the source
    pub frames: u64,
    /// Frames dropped before OCR
    pub skipped: u64,
    /// Frames where OCR failed
    pub failed: u64,
    /// Frames that produced a reading
    pub readings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_starts_empty() {
        assert!(ScanRegionSlot::new().get().is_none());
    }

    #[test]
    fn test_slot_shared_between_clones() {
        let slot = ScanRegionSlot::new();
        let reader = slot.clone();

        slot.set(ScanRegion::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(reader.get(), Some(ScanRegion::new(1.0, 2.0, 3.0, 4.0)));

        slot.clear();
        assert!(reader.get().is_none());
    }
}
