//! OCR and text extraction module.
//!
//! Extracts text from images and PDFs by running several OCR attempts
//! and keeping the best one:
//! - Each image is expanded into six preprocessed variants
//! - Tesseract runs every variant under each of its profiles
//! - PaddleOCR (feature: ocr-paddle) runs the original and threshold variants
//! - The longest candidate that looks like real text wins, and is cleaned up
//!
//! PDF pages use their embedded text (pdftotext) when there is enough of
//! it, and are rasterized (pdftoppm) and sent through the image pipeline
//! otherwise.
//!
//! ## OCR Backends
//!
//! Backends are looked up through a [`BackendRegistry`] by role. A missing
//! or broken backend is logged once and skipped; with no backends at all,
//! every image yields the empty sentinel.
//!
//! - **Tesseract**: classic OCR, CPU-based, two profiles (default, handwriting)
//! - **PaddleOCR**: CNN-based via ONNX, models auto-download (feature: ocr-paddle)

mod backend;
mod candidates;
mod deadline;
mod extractor;
mod model_utils;
mod normalize;
mod pdf;
mod preprocess;
mod registry;
mod selection;
mod tesseract;
mod types;

#[cfg(feature = "ocr-paddle")]
mod paddle_backend;

pub use extractor::{save_report, DocumentKind, ExtractError, TextExtractor, IMAGE_EXTENSIONS};
pub use pdf::{PdfDocument, PopplerPdf};
pub use registry::{BackendFactory, BackendRegistry};
pub use types::{
    Candidate, ExtractionOutcome, ExtractionReport, ImageAnalysis, ImageExtraction, OutputMode,
    PageResult, PdfExtraction, Provenance, TextResult,
};

// Building blocks, for callers that drive the stages themselves
pub use backend::{
    join_regions, BackendKind, BoundingBox, OcrBackend, OcrBackendType, OcrError,
    RecognitionProfile, TextRegion,
};
pub use candidates::{collect_candidates, CandidateCollection, NEURAL_VARIANTS};
pub use deadline::Deadline;
pub use normalize::{normalize, Normalized, INCOMPLETE_SENTINEL, MIN_NORMALIZED_LEN};
pub use preprocess::{generate_variants, ImageVariant, VariantTag};
pub use selection::{
    degraded_text, is_meaningful, select, Selection, SelectionConfig, DEGRADED_PREFIX,
    EMPTY_SENTINEL, MEANINGFUL_RATIO, MIN_CANDIDATE_LEN, MIN_MEANINGFUL_LEN,
    NEURAL_CONFIDENCE_FLOOR,
};
pub use tesseract::TesseractBackend;

#[cfg(feature = "ocr-paddle")]
pub use paddle_backend::PaddleBackend;
