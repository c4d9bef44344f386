//! Result types for text extraction.

use std::collections::BTreeMap;

use serde::Serialize;

use super::backend::OcrBackendType;
use super::preprocess::VariantTag;

/// How usable an extraction result is.
///
/// Callers branch on this rather than matching sentinel text; the
/// sentinel strings are only the rendered form of the non-`Ok` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// Nothing could be extracted.
    Empty,
    /// Something was extracted but it failed the quality checks.
    DegradedQuality,
    /// A meaningful candidate was selected.
    Ok,
}

impl ExtractionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionOutcome::Empty => "empty",
            ExtractionOutcome::DegradedQuality => "degraded_quality",
            ExtractionOutcome::Ok => "ok",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ExtractionOutcome::Ok)
    }
}

impl std::fmt::Display for ExtractionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a candidate text came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    /// Position of the source variant in the generated sequence.
    pub variant_index: usize,
    pub source_variant: VariantTag,
    pub backend: OcrBackendType,
    /// Engine profile, for backends that run more than one.
    pub config_name: Option<String>,
    /// Mean confidence of the kept regions, if the engine reports scores.
    pub confidence: Option<f32>,
    pub processing_time_ms: u64,
}

/// One OCR attempt's text plus its provenance. Text may be empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub text: String,
    pub provenance: Provenance,
}

impl Candidate {
    /// Length in characters of the raw text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Full diagnostic record for one image run through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ImageAnalysis {
    /// Variants in generation order.
    pub variants: Vec<VariantTag>,
    /// Classic backend text keyed by `version_<variant index>`, then by profile.
    pub classic_results: BTreeMap<String, BTreeMap<String, String>>,
    /// Neural backend text keyed by `version_<n>` (0 = original, 1 = threshold).
    pub neural_results: BTreeMap<String, String>,
    /// Every attempt made, including those that produced no text.
    pub attempts: Vec<Candidate>,
    /// Number of attempts that produced non-empty text.
    pub candidate_count: usize,
    /// Provenance of the candidate the final text was built from.
    pub selected: Option<Provenance>,
    pub combined_text: String,
    pub outcome: ExtractionOutcome,
}

/// Result of extracting a single image file.
#[derive(Debug, Clone, Serialize)]
pub struct ImageExtraction {
    pub file_path: String,
    /// SHA-256 of the file contents, hex-encoded.
    pub file_hash: String,
    #[serde(flatten)]
    pub analysis: ImageAnalysis,
}

/// One page of a PDF.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// 1-based page number.
    pub page_number: u32,
    /// Embedded text, extracted without OCR.
    pub direct_text: String,
    /// OCR text; only populated when the embedded text was insufficient.
    pub ocr_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_analysis: Option<ImageAnalysis>,
}

impl PageResult {
    /// Whether this page went through rasterize-then-OCR.
    pub fn used_ocr(&self) -> bool {
        self.ocr_analysis.is_some()
    }
}

/// Result of extracting a PDF.
#[derive(Debug, Clone, Serialize)]
pub struct PdfExtraction {
    pub file_path: String,
    pub file_hash: String,
    pub page_count: u32,
    /// All pages' embedded text, joined by newline.
    pub direct_text: String,
    /// All pages' OCR text, joined by newline. Empty for pages that were not OCR'd.
    pub ocr_text: String,
    pub pages: Vec<PageResult>,
    pub combined_text: String,
    pub outcome: ExtractionOutcome,
}

/// Detailed result of one extraction call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExtractionReport {
    Image(ImageExtraction),
    Pdf(PdfExtraction),
}

impl ExtractionReport {
    pub fn combined_text(&self) -> &str {
        match self {
            ExtractionReport::Image(image) => &image.analysis.combined_text,
            ExtractionReport::Pdf(pdf) => &pdf.combined_text,
        }
    }

    pub fn outcome(&self) -> ExtractionOutcome {
        match self {
            ExtractionReport::Image(image) => image.analysis.outcome,
            ExtractionReport::Pdf(pdf) => pdf.outcome,
        }
    }

    pub fn file_path(&self) -> &str {
        match self {
            ExtractionReport::Image(image) => &image.file_path,
            ExtractionReport::Pdf(pdf) => &pdf.file_path,
        }
    }
}

/// What an extraction call should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Only the final text.
    #[default]
    Plain,
    /// The full per-variant, per-backend, per-page report.
    Detailed,
}

/// Value returned by [`super::TextExtractor::extract`].
#[derive(Debug, Clone)]
pub enum TextResult {
    Plain(String),
    Detailed(ExtractionReport),
}

impl TextResult {
    pub fn text(&self) -> &str {
        match self {
            TextResult::Plain(text) => text,
            TextResult::Detailed(report) => report.combined_text(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            TextResult::Plain(text) => text,
            TextResult::Detailed(report) => report.combined_text().to_string(),
        }
    }

    /// The detailed report, if one was requested.
    pub fn into_report(self) -> Option<ExtractionReport> {
        match self {
            TextResult::Plain(_) => None,
            TextResult::Detailed(report) => Some(report),
        }
    }
}
