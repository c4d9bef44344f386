//! Text extraction from images and PDFs.
//!
//! Images go through the full variant, candidate and selection pipeline.
//! PDF pages use their embedded text when there is enough of it and are
//! rasterized and OCR'd otherwise.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::candidates::collect_candidates;
use super::deadline::Deadline;
use super::model_utils::check_binary;
use super::normalize::normalize;
use super::pdf::{PdfDocument, PdfOpenError, PopplerPdf};
use super::preprocess::generate_variants;
use super::registry::BackendRegistry;
use super::selection::{select, Selection};
use super::types::{
    ExtractionOutcome, ExtractionReport, ImageAnalysis, ImageExtraction, OutputMode, PageResult,
    PdfExtraction, TextResult,
};
use crate::config::ExtractorConfig;

/// Image extensions accepted by the router, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "gif"];

/// Errors surfaced to callers. Everything else is absorbed into the result.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Could not decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input document type, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if ext == "pdf" {
            Ok(DocumentKind::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(DocumentKind::Image)
        } else if ext.is_empty() {
            Err(ExtractError::UnsupportedFormat(format!(
                "{} has no extension",
                path.display()
            )))
        } else {
            Err(ExtractError::UnsupportedFormat(format!(".{}", ext)))
        }
    }
}

/// Multi-candidate text extractor.
///
/// Holds the backend registry and the pipeline configuration. Each call
/// keeps its intermediate data local, so one extractor can be shared
/// across threads.
pub struct TextExtractor {
    registry: BackendRegistry,
    config: ExtractorConfig,
}

impl TextExtractor {
    pub fn new(registry: BackendRegistry, config: ExtractorConfig) -> Self {
        Self { registry, config }
    }

    /// Extractor with whatever backends the config enables and the system provides.
    pub fn detect(config: ExtractorConfig) -> Self {
        let registry = BackendRegistry::detect(&config);
        Self::new(registry, config)
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Extract text from an image or PDF file.
    ///
    /// Fails only for a missing file, an unsupported extension, or a file
    /// that cannot be decoded. Poor or empty results come back as sentinel
    /// text with the matching [`ExtractionOutcome`].
    pub fn extract(&self, path: &Path, mode: OutputMode) -> Result<TextResult, ExtractError> {
        let report = self.extract_report(path)?;
        Ok(match mode {
            OutputMode::Plain => TextResult::Plain(report.combined_text().to_string()),
            OutputMode::Detailed => TextResult::Detailed(report),
        })
    }

    /// Final text only.
    pub fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        Ok(self.extract(path, OutputMode::Plain)?.into_text())
    }

    /// Full per-variant, per-backend, per-page report.
    pub fn extract_report(&self, path: &Path) -> Result<ExtractionReport, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.to_path_buf()));
        }
        let kind = DocumentKind::from_path(path)?;
        let deadline = Deadline::new(self.config.deadline());

        debug!("Extracting {} as {:?}", path.display(), kind);
        let report = match kind {
            DocumentKind::Image => {
                ExtractionReport::Image(self.extract_image_with(path, &deadline)?)
            }
            DocumentKind::Pdf => ExtractionReport::Pdf(self.extract_pdf_with(path, &deadline)?),
        };

        info!(
            "Extracted {} ({}) in {:?}",
            path.display(),
            report.outcome(),
            deadline.elapsed()
        );
        Ok(report)
    }

    /// Extract an image file.
    pub fn extract_image_file(&self, path: &Path) -> Result<ImageExtraction, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.to_path_buf()));
        }
        let deadline = Deadline::new(self.config.deadline());
        self.extract_image_with(path, &deadline)
    }

    /// Run the image pipeline on an already-decoded image.
    pub fn extract_image(&self, image: &DynamicImage) -> ImageAnalysis {
        let deadline = Deadline::new(self.config.deadline());
        self.analyze_image(image, &deadline)
    }

    /// Extract a PDF file.
    pub fn extract_pdf_file(&self, path: &Path) -> Result<PdfExtraction, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.to_path_buf()));
        }
        let deadline = Deadline::new(self.config.deadline());
        self.extract_pdf_with(path, &deadline)
    }

    /// Run the page router over an open document.
    ///
    /// `file_path` and `file_hash` are left empty; the file-based entry
    /// points fill them in.
    pub fn extract_pdf(&self, document: &dyn PdfDocument) -> PdfExtraction {
        let deadline = Deadline::new(self.config.deadline());
        self.process_pdf(document, &deadline)
    }

    /// Check if the external tools the pipeline shells out to are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        ["tesseract", "pdftotext", "pdftoppm", "pdfinfo"]
            .iter()
            .map(|tool| (tool.to_string(), check_binary(tool)))
            .collect()
    }

    fn extract_image_with(
        &self,
        path: &Path,
        deadline: &Deadline,
    ) -> Result<ImageExtraction, ExtractError> {
        let bytes = std::fs::read(path)?;
        let file_hash = hash_bytes(&bytes);

        let image = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .decode()
            .map_err(|e| ExtractError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!(
            "Decoded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        Ok(ImageExtraction {
            file_path: path.display().to_string(),
            file_hash,
            analysis: self.analyze_image(&image, deadline),
        })
    }

    fn extract_pdf_with(
        &self,
        path: &Path,
        deadline: &Deadline,
    ) -> Result<PdfExtraction, ExtractError> {
        let bytes = std::fs::read(path)?;
        let file_hash = hash_bytes(&bytes);

        let document = PopplerPdf::open(path).map_err(|e| match e {
            PdfOpenError::ToolNotFound(tool) => ExtractError::ToolNotFound(tool),
            PdfOpenError::Invalid(reason) => ExtractError::Decode {
                path: path.to_path_buf(),
                reason,
            },
            PdfOpenError::Io(e) => ExtractError::Io(e),
        })?;

        let mut extraction = self.process_pdf(&document, deadline);
        extraction.file_path = path.display().to_string();
        extraction.file_hash = file_hash;
        Ok(extraction)
    }

    /// Variants, candidates, selection and normalization for one image.
    fn analyze_image(&self, image: &DynamicImage, deadline: &Deadline) -> ImageAnalysis {
        let variants = generate_variants(image);
        let collection =
            collect_candidates(&variants, &self.registry, &self.config.selection, deadline);

        let selection = select(&collection.candidates, &self.config.selection);
        let (combined_text, outcome) = match selection {
            Selection::Meaningful(candidate) => {
                let normalized = normalize(&candidate.text);
                (normalized.text, normalized.outcome)
            }
            other => (other.render(), other.outcome()),
        };
        let selected = selection.candidate().map(|c| c.provenance.clone());

        if let Some(provenance) = &selected {
            debug!(
                "Selected {} output from {} variant ({})",
                provenance.backend, provenance.source_variant, outcome
            );
        } else {
            debug!("No OCR candidates produced");
        }

        ImageAnalysis {
            variants: variants.iter().map(|v| v.tag).collect(),
            candidate_count: collection.candidates.len(),
            classic_results: collection.classic_results,
            neural_results: collection.neural_results,
            attempts: collection.attempts,
            selected,
            combined_text,
            outcome,
        }
    }

    fn process_pdf(&self, document: &dyn PdfDocument, deadline: &Deadline) -> PdfExtraction {
        let page_count = document.page_count();
        let mut pages = Vec::with_capacity(page_count as usize);

        for page_number in 1..=page_count {
            let direct_text = match document.page_text(page_number) {
                Ok(text) => text,
                Err(e) => {
                    error!(page = page_number, "Embedded text extraction failed: {}", e);
                    String::new()
                }
            };

            let mut page = PageResult {
                page_number,
                direct_text,
                ocr_text: String::new(),
                ocr_analysis: None,
            };

            if page.direct_text.trim().chars().count() >= self.config.direct_text_min_len {
                pages.push(page);
                continue;
            }

            if deadline.expired() {
                warn!(
                    "Deadline reached after {:?}, skipping OCR for page {}",
                    deadline.elapsed(),
                    page_number
                );
                pages.push(page);
                continue;
            }

            debug!("Page {} has little embedded text, running OCR", page_number);
            match document.render_page(page_number, self.config.pdf_zoom) {
                Ok(image) => {
                    let analysis = self.analyze_image(&image, deadline);
                    page.ocr_text = analysis.combined_text.clone();
                    page.ocr_analysis = Some(analysis);
                }
                Err(e) => {
                    error!(page = page_number, "Page rasterization failed: {}", e);
                }
            }
            pages.push(page);
        }

        let direct_text = join_pages(&pages, |p| &p.direct_text);
        let ocr_text = join_pages(&pages, |p| &p.ocr_text);

        let (combined_text, outcome) = if !direct_text.trim().is_empty() {
            (direct_text.clone(), ExtractionOutcome::Ok)
        } else if !ocr_text.trim().is_empty() {
            let outcome = pages
                .iter()
                .filter_map(|p| p.ocr_analysis.as_ref().map(|a| a.outcome))
                .max()
                .unwrap_or(ExtractionOutcome::Empty);
            (ocr_text.clone(), outcome)
        } else {
            (String::new(), ExtractionOutcome::Empty)
        };

        PdfExtraction {
            file_path: String::new(),
            file_hash: String::new(),
            page_count,
            direct_text,
            ocr_text,
            pages,
            combined_text,
            outcome,
        }
    }
}

/// Join one text field of each page with newlines.
fn join_pages<'a>(
    pages: impl IntoIterator<Item = &'a PageResult>,
    field: impl Fn(&'a PageResult) -> &'a String,
) -> String {
    pages
        .into_iter()
        .map(field)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// SHA-256 of the input, hex-encoded.
fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Write a detailed report as pretty-printed JSON.
pub fn save_report(report: &ExtractionReport, path: &Path) -> Result<(), ExtractError> {
    let json = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
    std::fs::write(path, json)?;
    info!("Report saved to {}", path.display());
    Ok(())
}
