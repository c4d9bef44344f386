//! Candidate scoring and selection.
//!
//! OCR engines happily return noise for blurry or empty regions. The
//! selector filters candidates by length and by a "meaningfulness"
//! heuristic (share of alphanumeric/whitespace characters), then takes
//! the longest survivor. When nothing survives, a degraded result is
//! rendered from the longest unfiltered candidate.

use serde::{Deserialize, Serialize};

use super::types::{Candidate, ExtractionOutcome};

/// Candidates must be longer than this (trimmed, in characters).
pub const MIN_CANDIDATE_LEN: usize = 15;

/// Shorter texts are never considered meaningful.
pub const MIN_MEANINGFUL_LEN: usize = 10;

/// Alphanumeric-or-whitespace share a text must exceed to be meaningful.
pub const MEANINGFUL_RATIO: f64 = 0.70;

/// Neural regions at or below this confidence are discarded.
pub const NEURAL_CONFIDENCE_FLOOR: f32 = 0.1;

/// Characters of the best unfiltered candidate shown in a degraded result.
pub const DEGRADED_PREVIEW_CHARS: usize = 100;

/// Prefix of the degraded-quality sentinel.
pub const DEGRADED_PREFIX: &str = "Text extraction quality is poor. Extracted: ";

/// Sentinel rendered when no backend produced any text.
pub const EMPTY_SENTINEL: &str = "No readable text could be extracted from this image. Please ensure the image is clear, well-lit, and contains readable text.";

/// Tunable thresholds for candidate selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub min_candidate_len: usize,
    pub min_meaningful_len: usize,
    pub meaningful_ratio: f64,
    pub confidence_floor: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_candidate_len: MIN_CANDIDATE_LEN,
            min_meaningful_len: MIN_MEANINGFUL_LEN,
            meaningful_ratio: MEANINGFUL_RATIO,
            confidence_floor: NEURAL_CONFIDENCE_FLOOR,
        }
    }
}

/// Check if extracted text looks like real text rather than OCR noise.
///
/// The ratio is computed over the whole string, untrimmed, and must be
/// strictly greater than the configured threshold.
pub fn is_meaningful(text: &str, config: &SelectionConfig) -> bool {
    if text.trim().chars().count() < config.min_meaningful_len {
        return false;
    }

    let total = text.chars().count();
    let readable = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .count();

    (readable as f64 / total as f64) > config.meaningful_ratio
}

/// Outcome of ranking a candidate set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection<'a> {
    /// Longest candidate passing both filters.
    Meaningful(&'a Candidate),
    /// Nothing passed; longest unfiltered candidate.
    Degraded(&'a Candidate),
    /// No candidates at all.
    Empty,
}

impl<'a> Selection<'a> {
    pub fn outcome(&self) -> ExtractionOutcome {
        match self {
            Selection::Meaningful(_) => ExtractionOutcome::Ok,
            Selection::Degraded(_) => ExtractionOutcome::DegradedQuality,
            Selection::Empty => ExtractionOutcome::Empty,
        }
    }

    pub fn candidate(&self) -> Option<&'a Candidate> {
        match self {
            Selection::Meaningful(c) | Selection::Degraded(c) => Some(c),
            Selection::Empty => None,
        }
    }

    /// Text for the caller, with sentinels for the non-meaningful states.
    ///
    /// Meaningful candidates are returned raw; normalization happens later.
    pub fn render(&self) -> String {
        match self {
            Selection::Meaningful(c) => c.text.clone(),
            Selection::Degraded(c) => degraded_text(&c.text),
            Selection::Empty => EMPTY_SENTINEL.to_string(),
        }
    }
}

/// Render the degraded-quality sentinel for a candidate text.
pub fn degraded_text(text: &str) -> String {
    let preview: String = text.chars().take(DEGRADED_PREVIEW_CHARS).collect();
    format!("{}{}...", DEGRADED_PREFIX, preview)
}

/// Pick the best candidate.
///
/// Longer beats cleaner within the meaningful set. Ties are broken on
/// text and then provenance so the result never depends on the order in
/// which candidates were collected.
pub fn select<'a>(candidates: &'a [Candidate], config: &SelectionConfig) -> Selection<'a> {
    if candidates.is_empty() {
        return Selection::Empty;
    }

    let meaningful = candidates.iter().filter(|c| {
        c.text.trim().chars().count() > config.min_candidate_len && is_meaningful(&c.text, config)
    });

    if let Some(best) = longest(meaningful) {
        return Selection::Meaningful(best);
    }

    match longest(candidates.iter()) {
        Some(best) => Selection::Degraded(best),
        None => Selection::Empty,
    }
}

fn longest<'a>(candidates: impl Iterator<Item = &'a Candidate>) -> Option<&'a Candidate> {
    candidates.min_by(|a, b| {
        b.char_len()
            .cmp(&a.char_len())
            .then_with(|| a.text.cmp(&b.text))
            .then_with(|| a.provenance.variant_index.cmp(&b.provenance.variant_index))
            .then_with(|| a.provenance.backend.cmp(&b.provenance.backend))
            .then_with(|| a.provenance.config_name.cmp(&b.provenance.config_name))
    })
}
