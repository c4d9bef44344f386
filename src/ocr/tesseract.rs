//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.
//! This is the classic backend: every image variant is run through
//! each profile in [`TESSERACT_PROFILES`].

use std::path::Path;
use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;

use super::backend::{OcrBackend, OcrBackendType, OcrError, RecognitionProfile, TextRegion};
use super::model_utils::check_binary;

/// Characters allowed by the handwriting profile (digits, Latin letters, space).
pub const HANDWRITING_WHITELIST: &str =
    "tessedit_char_whitelist=0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz ";

/// Restricted-alphabet profile with single-block page segmentation.
pub const HANDWRITING_PROFILE: RecognitionProfile = RecognitionProfile {
    name: "handwriting",
    args: &["--oem", "3", "--psm", "6", "-c", HANDWRITING_WHITELIST],
};

/// Profiles run for every image, in order.
pub const TESSERACT_PROFILES: [RecognitionProfile; 2] =
    [RecognitionProfile::DEFAULT, HANDWRITING_PROFILE];

/// Tesseract OCR backend.
pub struct TesseractBackend {
    language: String,
}

impl TesseractBackend {
    /// Create a new Tesseract backend for English text.
    pub fn new() -> Self {
        Self::with_language("eng")
    }

    /// Create a new Tesseract backend for a specific language pack.
    pub fn with_language(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    /// Run Tesseract on an image file.
    fn run_tesseract(
        &self,
        image_path: &Path,
        profile: &RecognitionProfile,
    ) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .args(profile.args)
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!(
                        "tesseract ({}) failed: {}",
                        profile.name,
                        stderr.trim()
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if check_binary("tesseract") {
            format!("Tesseract is available (language: {})", self.language)
        } else {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        }
    }

    fn profiles(&self) -> &[RecognitionProfile] {
        &TESSERACT_PROFILES
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        profile: &RecognitionProfile,
    ) -> Result<Vec<TextRegion>, OcrError> {
        // Tesseract reads from disk, so stage the variant as a lossless PNG
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("variant.png");
        image
            .save(&image_path)
            .map_err(|e| OcrError::ImageError(format!("Failed to stage image: {}", e)))?;

        let text = self.run_tesseract(&image_path, profile)?;
        Ok(vec![TextRegion::whole_page(text.trim())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_profiles_are_default_then_handwriting() {
        let backend = TesseractBackend::new();
        let names: Vec<&str> = backend.profiles().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["default", "handwriting"]);
    }

    #[test]
    fn test_handwriting_profile_restricts_alphabet() {
        assert!(HANDWRITING_PROFILE.args.contains(&"--psm"));
        assert!(HANDWRITING_PROFILE.args.contains(&"6"));
        let whitelist = HANDWRITING_WHITELIST
            .strip_prefix("tessedit_char_whitelist=")
            .unwrap();
        assert!(whitelist
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' '));
        assert_eq!(whitelist.len(), 10 + 26 + 26 + 1);
    }

    #[test]
    fn test_recognize_blank_image() {
        let backend = TesseractBackend::new();
        if !backend.is_available() {
            println!("tesseract missing, skipping");
            return;
        }

        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([255])));
        let regions = backend
            .recognize(&blank, &RecognitionProfile::DEFAULT)
            .unwrap();
        assert_eq!(regions.len(), 1);
        assert!(regions[0].text.trim().is_empty());
    }
}
