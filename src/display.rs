//! Weight display model
//!
//! Holds what the UI shows and rate-limits how often a new reading may
//! replace it.

use std::time::{Duration, Instant};

/// Accepts at most one update per interval
#[derive(Debug, Clone)]
pub struct Debouncer {
    min_interval: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: None,
        }
    }

    /// Accept if nothing was accepted yet or strictly more than the interval passed
    pub fn accept(&mut self, now: Instant) -> bool {
        let ready = match self.last_accepted {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.min_interval,
        };
        if ready {
            self.last_accepted = Some(now);
        }
        ready
    }
}

/// The weight reading panel
#[derive(Debug, Clone)]
pub struct WeightDisplay {
    weight: String,
    is_scanning: bool,
    debouncer: Debouncer,
}

impl WeightDisplay {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            weight: String::new(),
            is_scanning: true,
            debouncer: Debouncer::new(min_interval),
        }
    }

    /// Offer a detected reading; returns whether the display changed
    pub fn offer(&mut self, reading: &str, now: Instant) -> bool {
        if reading.is_empty() || !self.debouncer.accept(now) {
            return false;
        }
        self.weight = reading.to_string();
        self.is_scanning = false;
        true
    }

    /// Scanning ended without further readings
    pub fn stop_scanning(&mut self) {
        self.is_scanning = false;
    }

    pub fn weight(&self) -> &str {
        &self.weight
    }

    #[cfg(test)]
    pub fn is_scanning(&self) -> bool {
        self.is_scanning
    }

    /// Text the panel shows
    pub fn status_line(&self) -> String {
        if !self.weight.is_empty() {
            format!("{} kg", self.weight)
        } else if self.is_scanning {
            "Align the scale display within the green box".to_string()
        } else {
            "No weight detected".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_millis(1000);

    #[test]
    fn test_debouncer_accepts_first() {
        let mut debouncer = Debouncer::new(SECOND);
        assert!(debouncer.accept(Instant::now()));
    }

    #[test]
    fn test_debouncer_window() {
        let mut debouncer = Debouncer::new(SECOND);
        let t0 = Instant::now();

        assert!(debouncer.accept(t0));
        assert!(!debouncer.accept(t0 + Duration::from_millis(500)));
        // Exactly the interval is still inside the window
        assert!(!debouncer.accept(t0 + SECOND));
        assert!(debouncer.accept(t0 + Duration::from_millis(1001)));
        // Rejected offers do not move the window
        assert!(!debouncer.accept(t0 + Duration::from_millis(1500)));
        assert!(debouncer.accept(t0 + Duration::from_millis(2002)));
    }

    #[test]
    fn test_display_initial_status() {
        let display = WeightDisplay::new(SECOND);
        assert!(display.is_scanning());
        assert_eq!(display.weight(), "");
        assert_eq!(
            display.status_line(),
            "Align the scale display within the green box"
        );
    }

    #[test]
    fn test_display_accepts_reading() {
        let mut display = WeightDisplay::new(SECOND);
        let t0 = Instant::now();

        assert!(display.offer("12.5", t0));
        assert!(!display.is_scanning());
        assert_eq!(display.status_line(), "12.5 kg");

        assert!(!display.offer("13.0", t0 + Duration::from_millis(10)));
        assert_eq!(display.weight(), "12.5");

        assert!(display.offer("13.0", t0 + Duration::from_millis(1200)));
        assert_eq!(display.weight(), "13.0");
    }

    #[test]
    fn test_display_ignores_empty_reading() {
        let mut display = WeightDisplay::new(SECOND);
        let t0 = Instant::now();

        assert!(!display.offer("", t0));
        assert!(display.is_scanning());
        // An empty offer does not consume the debounce window
        assert!(display.offer("4.0", t0));
    }

    #[test]
    fn test_display_no_weight_after_stop() {
        let mut display = WeightDisplay::new(SECOND);
        display.stop_scanning();
        assert_eq!(display.status_line(), "No weight detected");
    }
}
