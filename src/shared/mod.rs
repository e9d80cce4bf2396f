//! Shared state and messaging between the scanner and the display
//!
//! This module provides the thread-safe scan region slot and the message
//! types passed from the scanning loop to the display thread.

pub mod messages;
pub mod state;

pub use messages::ScannerEvent;
pub use state::{ScanRegionSlot, ScannerStats};
