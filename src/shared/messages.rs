//! Message types sent from the scanner to the display

use crate::vision::WeightReading;

/// Messages sent from the scanning loop to the display thread
#[derive(Debug, Clone)]
pub enum ScannerEvent {
    /// A frame produced a candidate reading
    Reading(WeightReading),
    /// Scanning started
    Started,
    /// The frame source ran dry or scanning was stopped
    Stopped,
}
