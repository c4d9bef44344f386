//! Cleanup of the selected candidate text.

use super::types::ExtractionOutcome;

/// Cleaned text shorter than this (trimmed, in characters) is rejected.
pub const MIN_NORMALIZED_LEN: usize = 15;

/// Sentinel rendered when cleanup leaves too little text.
pub const INCOMPLETE_SENTINEL: &str =
    "The extracted text appears to be incomplete or unclear. Please try with a higher quality image.";

/// Rendered for empty input.
pub const NO_TEXT_SENTINEL: &str = "No text extracted";

/// Normalized text and whether it is still usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub outcome: ExtractionOutcome,
}

/// Trim every line, drop lines of one character or less, and re-check length.
pub fn normalize(text: &str) -> Normalized {
    if text.is_empty() {
        return Normalized {
            text: NO_TEXT_SENTINEL.to_string(),
            outcome: ExtractionOutcome::Empty,
        };
    }

    let cleaned = text
        .split('\n')
        .map(str::trim)
        .filter(|line| line.chars().count() > 1)
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.trim().chars().count() < MIN_NORMALIZED_LEN {
        return Normalized {
            text: INCOMPLETE_SENTINEL.to_string(),
            outcome: ExtractionOutcome::DegradedQuality,
        };
    }

    Normalized {
        text: cleaned,
        outcome: ExtractionOutcome::Ok,
    }
}
