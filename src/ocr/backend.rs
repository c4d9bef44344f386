//! OCR backend abstraction.
//!
//! Two families of engines sit behind the same trait:
//! - Classic: Tesseract via command-line, several tuned profiles per image
//! - Neural: PaddleOCR via ONNX Runtime, per-region confidence scores

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    Tesseract,
    /// PaddleOCR via ONNX Runtime.
    PaddleOcr,
}

impl OcrBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::PaddleOcr => "paddleocr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tesseract" => Some(OcrBackendType::Tesseract),
            "paddleocr" | "paddle" => Some(OcrBackendType::PaddleOcr),
            _ => None,
        }
    }

    /// Which slot of the registry this engine fills.
    pub fn kind(&self) -> BackendKind {
        match self {
            OcrBackendType::Tesseract => BackendKind::Classic,
            OcrBackendType::PaddleOcr => BackendKind::Neural,
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role a backend plays in the candidate pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Fast, printed-text oriented; run on every variant with every profile.
    Classic,
    /// Slower, better on handwriting; run on the original and threshold variants only.
    Neural,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Classic => "classic",
            BackendKind::Neural => "neural",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Polygon around a detected text region, in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
    pub points: Vec<(f32, f32)>,
}

/// One piece of recognized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRegion {
    pub text: String,
    /// Confidence score (0.0 - 1.0), if the engine reports one.
    pub confidence: Option<f32>,
    pub bbox: Option<BoundingBox>,
}

impl TextRegion {
    /// Region covering the whole image, without a score.
    pub fn whole_page(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            bbox: None,
        }
    }
}

/// A named engine configuration. Each profile is run as an independent attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionProfile {
    pub name: &'static str,
    /// Extra engine arguments (only meaningful to command-line engines).
    pub args: &'static [&'static str],
}

impl RecognitionProfile {
    pub const DEFAULT: RecognitionProfile = RecognitionProfile {
        name: "default",
        args: &[],
    };
}

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (dependencies installed, models present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Load models or warm up the engine. Called once before first use.
    fn initialize(&self) -> Result<(), OcrError> {
        Ok(())
    }

    /// Profiles to run for every image this backend sees.
    fn profiles(&self) -> &[RecognitionProfile] {
        &[RecognitionProfile::DEFAULT]
    }

    /// Recognize text in a decoded image using one profile.
    fn recognize(
        &self,
        image: &DynamicImage,
        profile: &RecognitionProfile,
    ) -> Result<Vec<TextRegion>, OcrError>;
}

/// Join region texts with single spaces, dropping regions at or below the confidence floor.
///
/// Regions without a score are always kept.
pub fn join_regions(regions: &[TextRegion], confidence_floor: f32) -> (String, Option<f32>) {
    let kept: Vec<&TextRegion> = regions
        .iter()
        .filter(|r| r.confidence.map_or(true, |c| c > confidence_floor))
        .collect();

    let text = kept
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let scores: Vec<f32> = kept.iter().filter_map(|r| r.confidence).collect();
    let confidence = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f32>() / scores.len() as f32)
    };

    (text, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str, confidence: f32) -> TextRegion {
        TextRegion {
            text: text.to_string(),
            confidence: Some(confidence),
            bbox: None,
        }
    }

    #[test]
    fn test_backend_type_roundtrip_names() {
        assert_eq!(OcrBackendType::from_str("Tesseract"), Some(OcrBackendType::Tesseract));
        assert_eq!(OcrBackendType::from_str("paddle"), Some(OcrBackendType::PaddleOcr));
        assert_eq!(OcrBackendType::from_str("easyocr"), None);
        assert_eq!(OcrBackendType::PaddleOcr.to_string(), "paddleocr");
        assert_eq!(OcrBackendType::Tesseract.kind(), BackendKind::Classic);
        assert_eq!(OcrBackendType::PaddleOcr.kind(), BackendKind::Neural);
    }

    #[test]
    fn test_join_regions_drops_low_confidence() {
        let regions = vec![
            region("Hello", 0.9),
            region("noise", 0.05),
            region("World", 0.7),
        ];
        let (text, confidence) = join_regions(&regions, 0.1);
        assert_eq!(text, "Hello World");
        let confidence = confidence.unwrap();
        assert!((confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_join_regions_floor_is_exclusive() {
        let regions = vec![region("edge", 0.1), region("kept", 0.11)];
        let (text, _) = join_regions(&regions, 0.1);
        assert_eq!(text, "kept");
    }

    #[test]
    fn test_join_regions_keeps_unscored() {
        let regions = vec![TextRegion::whole_page("plain text")];
        let (text, confidence) = join_regions(&regions, 0.1);
        assert_eq!(text, "plain text");
        assert!(confidence.is_none());
    }

    #[test]
    fn test_join_regions_empty() {
        let (text, confidence) = join_regions(&[], 0.1);
        assert!(text.is_empty());
        assert!(confidence.is_none());
    }
}
