//! Scan box layout
//!
//! Computes where the scan box sits in the camera preview and publishes it
//! to the frame processor. Drawing the box is left to the UI layer.

use tracing::debug;

use crate::config::OverlaySettings;
use crate::shared::ScanRegionSlot;
use crate::vision::ScanRegion;

/// Lays out the scan box and publishes it on every layout pass
pub struct ScanOverlay {
    settings: OverlaySettings,
    slot: ScanRegionSlot,
}

impl ScanOverlay {
    pub fn new(settings: OverlaySettings, slot: ScanRegionSlot) -> Self {
        Self { settings, slot }
    }

    /// Scan box for a preview of the given size, in preview coordinates
    ///
    /// Returns None when the preview is too small to hold a box.
    pub fn layout(&self, view_width: f32, view_height: f32) -> Option<ScanRegion> {
        let s = &self.settings;
        let area_width = view_width - 2.0 * s.inset;
        let area_height = view_height - 2.0 * s.inset;
        if area_width <= 0.0 || area_height <= 0.0 {
            return None;
        }

        let region = ScanRegion::new(
            s.inset + area_width * s.left_fraction,
            s.inset + area_height * s.top_fraction,
            area_width * s.width_fraction,
            area_height * s.height_fraction,
        );
        (!region.is_empty()).then_some(region)
    }

    /// Lay out for a new preview size and publish the result
    ///
    /// A preview that cannot hold a box clears the published region.
    pub fn on_layout(&self, view_width: f32, view_height: f32) -> Option<ScanRegion> {
        let region = self.layout(view_width, view_height);
        match region {
            Some(region) => {
                debug!(
                    "Scan region for {}x{} preview: {:?}",
                    view_width, view_height, region
                );
                self.slot.set(region);
            }
            None => {
                debug!("Preview {}x{} too small for a scan region", view_width, view_height);
                self.slot.clear();
            }
        }
        region
    }
}
