//! Scan region geometry
//!
//! The scan region is laid out in view coordinates while OCR bounding boxes
//! come back in sensor coordinates. This module maps one into the other for
//! the four right-angle sensor rotations and filters OCR blocks against it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TextBlock;

/// Sensor rotation relative to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("rotation must be 0, 90, 180 or 270 degrees, got {0}")]
pub struct InvalidRotation(pub u32);

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// 90 and 270 swap the sensor's axes relative to the view
    pub fn is_portrait(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<u32> for Rotation {
    type Error = InvalidRotation;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(InvalidRotation(other)),
        }
    }
}

impl From<Rotation> for u32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Rectangle the user aligns with the scale display, in view coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanRegion {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScanRegion {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A region with no area cannot select anything
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Integer rectangle in sensor coordinates (right/bottom exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Edges saturate at the `i32` range instead of wrapping
    pub fn from_size(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self::new(left, top, left.saturating_add(width), top.saturating_add(height))
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Overlap test; rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Dimensions of the analysis frame and of the sensor buffer backing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub frame_width: u32,
    pub frame_height: u32,
    pub sensor_width: u32,
    pub sensor_height: u32,
}

impl FrameGeometry {
    pub fn new(frame: (u32, u32), sensor: (u32, u32)) -> Self {
        Self {
            frame_width: frame.0,
            frame_height: frame.1,
            sensor_width: sensor.0,
            sensor_height: sensor.1,
        }
    }

    /// Geometry where sensor and frame share dimensions
    #[cfg(test)]
    pub fn uniform(width: u32, height: u32) -> Self {
        Self::new((width, height), (width, height))
    }

    /// Per-axis scale from view space to sensor space for a rotation
    fn scale(&self, rotation: Rotation) -> (f32, f32) {
        let fw = self.frame_width.max(1) as f32;
        let fh = self.frame_height.max(1) as f32;
        let sw = self.sensor_width as f32;
        let sh = self.sensor_height as f32;

        if rotation.is_portrait() {
            (sh / fh, sw / fw)
        } else {
            (sw / fw, sh / fh)
        }
    }
}

/// Map a view-space scan region into sensor coordinates
pub fn map_to_sensor(region: &ScanRegion, geometry: &FrameGeometry, rotation: Rotation) -> PixelRect {
    let (sx, sy) = geometry.scale(rotation);
    let fw = geometry.frame_width as f32;
    let fh = geometry.frame_height as f32;

    // Truncation toward zero mirrors the platform's float-to-int conversion
    let (left, top, width, height) = match rotation {
        Rotation::Deg90 => (
            (region.top * sx) as i32,
            ((fw - region.left - region.width) * sy) as i32,
            (region.height * sx) as i32,
            (region.width * sy) as i32,
        ),
        Rotation::Deg270 => (
            ((fh - region.top - region.height) * sx) as i32,
            (region.left * sy) as i32,
            (region.height * sx) as i32,
            (region.width * sy) as i32,
        ),
        Rotation::Deg180 => (
            ((fw - region.left - region.width) * sx) as i32,
            ((fh - region.top - region.height) * sy) as i32,
            (region.width * sx) as i32,
            (region.height * sy) as i32,
        ),
        Rotation::Deg0 => (
            (region.left * sx) as i32,
            (region.top * sy) as i32,
            (region.width * sx) as i32,
            (region.height * sy) as i32,
        ),
    };

    PixelRect::from_size(left, top, width, height)
}

/// Map a box found in the upright image back into sensor coordinates
///
/// Inverse of rotating the sensor image clockwise by `rotation`.
#[cfg(any(test, windows))]
pub fn upright_to_sensor(rect: &PixelRect, sensor_width: u32, sensor_height: u32, rotation: Rotation) -> PixelRect {
    let sw = sensor_width as i32;
    let sh = sensor_height as i32;
    match rotation {
        Rotation::Deg0 => *rect,
        Rotation::Deg90 => PixelRect::new(rect.top, sh - rect.right, rect.bottom, sh - rect.left),
        Rotation::Deg180 => PixelRect::new(sw - rect.right, sh - rect.bottom, sw - rect.left, sh - rect.top),
        Rotation::Deg270 => PixelRect::new(sw - rect.bottom, rect.left, sw - rect.top, rect.right),
    }
}

/// Blocks whose bounding box overlaps the crop rectangle, in original order
pub fn blocks_in_region<'a>(blocks: &'a [TextBlock], crop: &PixelRect) -> Vec<&'a TextBlock> {
    blocks
        .iter()
        .filter(|block| block.bounds.is_some_and(|bounds| bounds.intersects(crop)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_region(rect: PixelRect) -> ScanRegion {
        ScanRegion::new(
            rect.left as f32,
            rect.top as f32,
            rect.width() as f32,
            rect.height() as f32,
        )
    }

    fn block(text: &str, bounds: Option<PixelRect>) -> TextBlock {
        TextBlock {
            text: text.to_string(),
            bounds,
        }
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::try_from(0), Ok(Rotation::Deg0));
        assert_eq!(Rotation::try_from(90), Ok(Rotation::Deg90));
        assert_eq!(Rotation::try_from(180), Ok(Rotation::Deg180));
        assert_eq!(Rotation::try_from(270), Ok(Rotation::Deg270));
        assert_eq!(Rotation::try_from(45), Err(InvalidRotation(45)));
        assert_eq!(Rotation::try_from(360), Err(InvalidRotation(360)));
    }

    #[test]
    fn test_map_unrotated_scales_directly() {
        let geometry = FrameGeometry::new((640, 480), (1280, 960));
        let region = ScanRegion::new(100.0, 50.0, 200.0, 40.0);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg0);

        assert_eq!(mapped, PixelRect::from_size(200, 100, 400, 80));
    }

    #[test]
    fn test_map_90_swaps_axes() {
        let geometry = FrameGeometry::uniform(480, 640);
        let region = ScanRegion::new(72.0, 256.0, 336.0, 96.0);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg90);

        // left <- top, top <- mirrored left, width <- height
        assert_eq!(mapped, PixelRect::from_size(256, 72, 96, 336));
    }

    #[test]
    fn test_map_90_with_scaling() {
        // Sensor is twice the analysis frame in both dimensions
        let geometry = FrameGeometry::new((480, 640), (960, 1280));
        let region = ScanRegion::new(40.0, 100.0, 200.0, 50.0);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg90);

        // sx = 1280 / 640, sy = 960 / 480
        assert_eq!(mapped, PixelRect::from_size(200, 480, 100, 400));
    }

    #[test]
    fn test_map_270_mirrors_vertical_axis() {
        let geometry = FrameGeometry::uniform(480, 640);
        let region = ScanRegion::new(40.0, 100.0, 200.0, 50.0);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg270);

        assert_eq!(mapped, PixelRect::from_size(490, 40, 50, 200));
    }

    #[test]
    fn test_map_180_mirrors_both_axes() {
        let geometry = FrameGeometry::uniform(640, 480);
        let region = ScanRegion::new(100.0, 50.0, 200.0, 40.0);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg180);

        assert_eq!(mapped, PixelRect::from_size(340, 390, 200, 40));
    }

    #[test]
    fn test_map_truncates_toward_zero() {
        let geometry = FrameGeometry::new((300, 300), (400, 400));
        let region = ScanRegion::new(10.0, 10.0, 10.0, 10.0);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg0);

        // 13.33 -> 13
        assert_eq!(mapped, PixelRect::from_size(13, 13, 13, 13));
    }

    #[test]
    fn test_map_saturates_huge_sensor() {
        let geometry = FrameGeometry::new((1, 1), (4_000_000_000, 4_000_000_000));
        let region = ScanRegion::new(0.5, 0.5, 0.5, 0.5);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg0);

        assert_eq!(mapped.left, 2_000_000_000);
        assert_eq!(mapped.top, 2_000_000_000);
        assert_eq!(mapped.right, i32::MAX);
        assert_eq!(mapped.bottom, i32::MAX);
        assert!(mapped.width() > 0);
    }

    #[test]
    fn test_map_270_with_scaling() {
        // Portrait: sx = 1800 / 600, sy = 800 / 400
        let geometry = FrameGeometry::new((400, 600), (800, 1800));
        let region = ScanRegion::new(40.0, 100.0, 200.0, 50.0);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg270);

        assert_eq!(mapped, PixelRect::from_size(1350, 80, 150, 400));
    }

    #[test]
    fn test_map_180_with_scaling() {
        // Landscape: sx = 1200 / 400, sy = 600 / 300
        let geometry = FrameGeometry::new((400, 300), (1200, 600));
        let region = ScanRegion::new(100.0, 50.0, 200.0, 40.0);

        let mapped = map_to_sensor(&region, &geometry, Rotation::Deg180);

        assert_eq!(mapped, PixelRect::from_size(300, 420, 600, 80));
    }

    #[test]
    fn test_90_then_270_round_trips() {
        let geometry = FrameGeometry::uniform(480, 640);
        let region = ScanRegion::new(72.0, 256.0, 336.0, 96.0);

        let rotated = map_to_sensor(&region, &geometry, Rotation::Deg90);
        // The rotated rectangle lives in a frame with transposed dimensions
        let transposed = FrameGeometry::uniform(640, 480);
        let back = map_to_sensor(&as_region(rotated), &transposed, Rotation::Deg270);

        assert_eq!(back, PixelRect::from_size(72, 256, 336, 96));
    }

    #[test]
    fn test_180_twice_round_trips() {
        let geometry = FrameGeometry::uniform(640, 480);
        let region = ScanRegion::new(17.0, 333.0, 250.0, 91.0);

        let once = map_to_sensor(&region, &geometry, Rotation::Deg180);
        let twice = map_to_sensor(&as_region(once), &geometry, Rotation::Deg180);

        assert_eq!(twice, PixelRect::from_size(17, 333, 250, 91));
    }

    #[test]
    fn test_upright_to_sensor() {
        // Sensor 40x30; the upright image is 30x40 for 90/270
        let upright = PixelRect::new(2, 5, 12, 9);

        assert_eq!(upright_to_sensor(&upright, 40, 30, Rotation::Deg0), upright);
        assert_eq!(
            upright_to_sensor(&upright, 40, 30, Rotation::Deg90),
            PixelRect::new(5, 18, 9, 28)
        );
        assert_eq!(
            upright_to_sensor(&upright, 40, 30, Rotation::Deg180),
            PixelRect::new(28, 21, 38, 25)
        );
        assert_eq!(
            upright_to_sensor(&upright, 40, 30, Rotation::Deg270),
            PixelRect::new(31, 2, 35, 12)
        );
    }

    #[test]
    fn test_intersects_is_strict() {
        let a = PixelRect::new(0, 0, 10, 10);
        assert!(a.intersects(&PixelRect::new(5, 5, 15, 15)));
        assert!(a.intersects(&PixelRect::new(2, 2, 4, 4)));
        // Shared edge only
        assert!(!a.intersects(&PixelRect::new(10, 0, 20, 10)));
        assert!(!a.intersects(&PixelRect::new(0, 10, 10, 20)));
        assert!(!a.intersects(&PixelRect::new(50, 50, 60, 60)));
    }

    #[test]
    fn test_blocks_in_region_keeps_order_and_drops_unboxed() {
        let crop = PixelRect::new(100, 100, 300, 200);
        let blocks = vec![
            block("BRAND", Some(PixelRect::new(0, 0, 80, 20))),
            block("12.5", Some(PixelRect::new(150, 120, 250, 180))),
            block("floating", None),
            block("kg", Some(PixelRect::new(280, 150, 320, 190))),
        ];

        let kept: Vec<&str> = blocks_in_region(&blocks, &crop)
            .into_iter()
            .map(|b| b.text.as_str())
            .collect();

        assert_eq!(kept, vec!["12.5", "kg"]);
    }

    #[test]
    fn test_scan_region_is_empty() {
        assert!(ScanRegion::new(0.0, 0.0, 0.0, 10.0).is_empty());
        assert!(ScanRegion::new(0.0, 0.0, 10.0, -1.0).is_empty());
        assert!(!ScanRegion::new(0.0, 0.0, 10.0, 10.0).is_empty());
    }

    #[test]
    fn test_rotation_serde_as_degrees() {
        let json = serde_json::to_string(&Rotation::Deg270).unwrap();
        assert_eq!(json, "270");
        let parsed: Rotation = serde_json::from_str("90").unwrap();
        assert_eq!(parsed, Rotation::Deg90);
        assert!(serde_json::from_str::<Rotation>("45").is_err());
    }
}
