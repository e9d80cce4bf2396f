//! Numeric candidate extraction
//!
//! Picks the substring of recognized text that most plausibly is the weight
//! shown on a scale's display. Lines are scanned in order and the first line
//! whose first number passes validation wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Characters a reading may consist of
const READING_CHARSET: &str = "0123456789.";

/// Digit limits of a plausible display reading (strict policy)
const STRICT_INTEGER_DIGITS: usize = 3;
const STRICT_FRACTION_DIGITS: usize = 2;

static NUMBER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn number_pattern() -> &'static Regex {
    NUMBER_PATTERN.get_or_init(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("valid number pattern"))
}

/// How picky the extractor is about a matched number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Any finite decimal number
    #[default]
    Lenient,
    /// At most 3 integer and 2 fractional digits
    Strict,
}

/// A number found in recognized text
#[derive(Debug, Clone, PartialEq)]
pub struct NumericCandidate {
    /// Matched text, exactly as recognized
    pub raw: String,
    /// Parsed value, if the text is a finite number
    pub value: Option<f64>,
}

impl NumericCandidate {
    fn new(raw: &str) -> Self {
        let value = raw.parse::<f64>().ok().filter(|v| v.is_finite());
        Self {
            raw: raw.to_string(),
            value,
        }
    }
}

/// Extracts the displayed weight from OCR text
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericExtractor {
    policy: ExtractionPolicy,
}

impl NumericExtractor {
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self { policy }
    }

    /// Returns the best reading, or an empty string when nothing qualifies
    pub fn extract(&self, text: &str) -> String {
        self.extract_candidate(text)
            .map(|candidate| candidate.raw)
            .unwrap_or_default()
    }

    /// Returns the first qualifying candidate in line order
    pub fn extract_candidate(&self, text: &str) -> Option<NumericCandidate> {
        text.lines()
            .filter_map(|line| number_pattern().find(line))
            .map(|m| NumericCandidate::new(m.as_str()))
            .find(|candidate| self.accepts(candidate))
    }

    /// Whether a matched candidate is acceptable as a reading
    pub fn accepts(&self, candidate: &NumericCandidate) -> bool {
        if !is_reading_charset(&candidate.raw) || candidate.value.is_none() {
            return false;
        }

        match self.policy {
            ExtractionPolicy::Lenient => true,
            ExtractionPolicy::Strict => fits_display(&candidate.raw),
        }
    }
}

/// Every character is a digit or the decimal point
pub fn is_reading_charset(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| READING_CHARSET.contains(c))
}

fn fits_display(raw: &str) -> bool {
    let (integer, fraction) = match raw.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (raw, ""),
    };
    integer.len() <= STRICT_INTEGER_DIGITS && fraction.len() <= STRICT_FRACTION_DIGITS
}
