//! PDF page access: embedded text and rasterization.
//!
//! [`PopplerPdf`] shells out to the Poppler tools:
//! - pdfinfo for the page count (and to reject files that are not PDFs)
//! - pdftotext for per-page embedded text
//! - pdftoppm for rendering a page to PNG

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;

use super::backend::OcrError;
use super::model_utils::check_binary;

/// PDF user-space units per inch.
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Message for a missing Poppler install.
pub const POPPLER_NOT_FOUND: &str = "install poppler-utils";

/// Page-level access to a PDF document. Pages are 1-based.
pub trait PdfDocument {
    fn page_count(&self) -> u32;

    /// Embedded text of one page, without OCR.
    fn page_text(&self, page: u32) -> Result<String, OcrError>;

    /// Render one page at `zoom` times its natural (72 DPI) size.
    fn render_page(&self, page: u32, zoom: f32) -> Result<DynamicImage, OcrError>;
}

/// Why a PDF could not be opened.
#[derive(Debug)]
pub enum PdfOpenError {
    /// pdfinfo is not installed.
    ToolNotFound(String),
    /// The file is not a readable PDF.
    Invalid(String),
    Io(std::io::Error),
}

/// A PDF on disk, read through the Poppler command-line tools.
#[derive(Debug, Clone)]
pub struct PopplerPdf {
    path: PathBuf,
    page_count: u32,
}

impl PopplerPdf {
    /// Open a PDF, validating it with pdfinfo.
    pub fn open(path: &Path) -> Result<Self, PdfOpenError> {
        let output = Command::new("pdfinfo").arg(path).output();

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PdfOpenError::ToolNotFound(format!(
                    "pdfinfo ({})",
                    POPPLER_NOT_FOUND
                )))
            }
            Err(e) => return Err(PdfOpenError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfOpenError::Invalid(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let page_count = parse_page_count(&stdout).ok_or_else(|| {
            PdfOpenError::Invalid("pdfinfo reported no page count".to_string())
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            page_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the Poppler tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        ["pdfinfo", "pdftotext", "pdftoppm"]
            .iter()
            .map(|tool| (tool.to_string(), check_binary(tool)))
            .collect()
    }
}

impl PdfDocument for PopplerPdf {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_text(&self, page: u32) -> Result<String, OcrError> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(&self.path)
            .arg("-") // Output to stdout
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => Err(OcrError::OcrFailed(format!(
                "pdftotext failed on page {}: {}",
                page,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(format!("pdftotext ({})", POPPLER_NOT_FOUND)),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }

    fn render_page(&self, page: u32, zoom: f32) -> Result<DynamicImage, OcrError> {
        let temp_dir = TempDir::new()?;
        let output_prefix = temp_dir.path().join("page");
        let page_str = page.to_string();
        let dpi = zoom_to_dpi(zoom).to_string();

        let status = Command::new("pdftoppm")
            .args(["-png", "-singlefile", "-r", &dpi, "-f", &page_str, "-l", &page_str])
            .arg(&self.path)
            .arg(&output_prefix)
            .status();

        match status {
            Ok(s) if s.success() => {}
            Ok(_) => {
                return Err(OcrError::OcrFailed(format!(
                    "pdftoppm failed to convert page {}",
                    page
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::BackendNotAvailable(format!(
                    "pdftoppm ({})",
                    POPPLER_NOT_FOUND
                )))
            }
            Err(e) => return Err(OcrError::Io(e)),
        }

        let image_path = temp_dir.path().join("page.png");
        if !image_path.exists() {
            return Err(OcrError::OcrFailed(format!(
                "No image generated for page {}",
                page
            )));
        }

        image::open(&image_path)
            .map_err(|e| OcrError::ImageError(format!("Failed to load page {}: {}", page, e)))
    }
}

/// Rendering resolution for a zoom factor over the 72 DPI base.
pub fn zoom_to_dpi(zoom: f32) -> u32 {
    (PDF_POINTS_PER_INCH * zoom).round().max(1.0) as u32
}

/// Extract the `Pages:` field from pdfinfo output.
fn parse_page_count(info: &str) -> Option<u32> {
    info.lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|count| count.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_zoom_to_dpi() {
        assert_eq!(zoom_to_dpi(1.0), 72);
        assert_eq!(zoom_to_dpi(2.0), 144);
        assert_eq!(zoom_to_dpi(0.0), 1);
    }

    #[test]
    fn test_parse_page_count() {
        let info = "Title:          Report\nProducer:       Writer\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn test_open_rejects_non_pdf() {
        if !check_binary("pdfinfo") {
            println!("pdfinfo missing, skipping");
            return;
        }

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fake.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        assert!(matches!(
            PopplerPdf::open(&path),
            Err(PdfOpenError::Invalid(_))
        ));
    }

    #[test]
    fn test_check_tools() {
        let tools = PopplerPdf::check_tools();
        assert_eq!(tools.len(), 3);
        for (tool, available) in tools {
            println!("{}: {}", tool, if available { "found" } else { "missing" });
        }
    }
}
