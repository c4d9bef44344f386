//! Extraction Pipeline Tests
//!
//! Drives the full image and PDF paths with scripted OCR backends and an
//! in-memory PDF, so no external binaries are needed.

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GrayImage, Luma};
use ocrsift::config::ExtractorConfig;
use ocrsift::ocr::{
    BackendKind, BackendRegistry, ExtractError, ExtractionOutcome, ExtractionReport, OcrBackend,
    OcrBackendType, OcrError, OutputMode, PdfDocument, RecognitionProfile, TextExtractor,
    TextRegion, VariantTag, DEGRADED_PREFIX, EMPTY_SENTINEL,
};
use tempfile::TempDir;

const CLASSIC_PROFILES: [RecognitionProfile; 2] = [
    RecognitionProfile::DEFAULT,
    RecognitionProfile {
        name: "handwriting",
        args: &[],
    },
];

/// Backend returning the same text for every image, per profile.
struct ScriptedBackend {
    backend_type: OcrBackendType,
    default_text: Vec<&'static str>,
    handwriting_text: Vec<&'static str>,
}

impl ScriptedBackend {
    fn classic(default_text: &'static str, handwriting_text: &'static str) -> Arc<dyn OcrBackend> {
        Arc::new(Self {
            backend_type: OcrBackendType::Tesseract,
            default_text: vec![default_text],
            handwriting_text: vec![handwriting_text],
        })
    }

    fn neural(regions: Vec<&'static str>) -> Arc<dyn OcrBackend> {
        Arc::new(Self {
            backend_type: OcrBackendType::PaddleOcr,
            default_text: regions,
            handwriting_text: vec![],
        })
    }
}

impl OcrBackend for ScriptedBackend {
    fn backend_type(&self) -> OcrBackendType {
        self.backend_type
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    fn profiles(&self) -> &[RecognitionProfile] {
        match self.backend_type {
            OcrBackendType::Tesseract => &CLASSIC_PROFILES,
            OcrBackendType::PaddleOcr => &CLASSIC_PROFILES[..1],
        }
    }

    fn recognize(
        &self,
        _image: &DynamicImage,
        profile: &RecognitionProfile,
    ) -> Result<Vec<TextRegion>, OcrError> {
        let texts = if profile.name == "handwriting" {
            &self.handwriting_text
        } else {
            &self.default_text
        };
        Ok(texts
            .iter()
            .map(|text| TextRegion {
                text: text.to_string(),
                confidence: (self.backend_type == OcrBackendType::PaddleOcr).then_some(0.9),
                bbox: None,
            })
            .collect())
    }
}

/// In-memory PDF: fixed embedded text per page, blank page renders.
struct FakePdf {
    pages: Vec<&'static str>,
    broken_renders: Vec<u32>,
    rendered: RefCell<Vec<u32>>,
}

impl FakePdf {
    fn new(pages: Vec<&'static str>) -> Self {
        Self {
            pages,
            broken_renders: vec![],
            rendered: RefCell::new(vec![]),
        }
    }
}

impl PdfDocument for FakePdf {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, OcrError> {
        Ok(self.pages[(page - 1) as usize].to_string())
    }

    fn render_page(&self, page: u32, zoom: f32) -> Result<DynamicImage, OcrError> {
        assert_eq!(zoom, 2.0);
        self.rendered.borrow_mut().push(page);
        if self.broken_renders.contains(&page) {
            return Err(OcrError::OcrFailed(format!("cannot render page {}", page)));
        }
        Ok(blank_image())
    }
}

fn blank_image() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(48, 48, Luma([255])))
}

fn extractor(classic: Arc<dyn OcrBackend>, neural: Arc<dyn OcrBackend>) -> TextExtractor {
    let registry = BackendRegistry::empty()
        .with_backend(BackendKind::Classic, classic)
        .with_backend(BackendKind::Neural, neural);
    TextExtractor::new(registry, ExtractorConfig::default())
}

fn write_blank_png(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    GrayImage::from_pixel(64, 64, Luma([255])).save(&path).unwrap();
    path
}

#[test]
fn test_blank_image_yields_empty_sentinel() {
    let extractor = extractor(ScriptedBackend::classic("", ""), ScriptedBackend::neural(vec![]));

    let analysis = extractor.extract_image(&blank_image());
    assert_eq!(analysis.outcome, ExtractionOutcome::Empty);
    assert_eq!(analysis.combined_text, EMPTY_SENTINEL);
    assert!(analysis.combined_text.contains("No readable text"));
    assert_eq!(analysis.candidate_count, 0);
    // 6 variants x 2 profiles + original and threshold on the neural backend
    assert_eq!(analysis.attempts.len(), 14);
    assert!(analysis.selected.is_none());
}

#[test]
fn test_no_backends_yields_empty_sentinel() {
    let temp = TempDir::new().unwrap();
    let path = write_blank_png(temp.path(), "blank.png");

    let extractor = TextExtractor::new(BackendRegistry::empty(), ExtractorConfig::default());
    let text = extractor.extract_text(&path).unwrap();
    assert_eq!(text, EMPTY_SENTINEL);
}

#[test]
fn test_longest_meaningful_candidate_wins() {
    let extractor = extractor(
        ScriptedBackend::classic(
            "Short clean line here",
            "~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~",
        ),
        ScriptedBackend::neural(vec!["A considerably longer line", "of handwritten words"]),
    );

    let analysis = extractor.extract_image(&blank_image());
    assert_eq!(analysis.outcome, ExtractionOutcome::Ok);
    assert_eq!(
        analysis.combined_text,
        "A considerably longer line of handwritten words"
    );

    let selected = analysis.selected.unwrap();
    assert_eq!(selected.backend, OcrBackendType::PaddleOcr);
    assert_eq!(selected.source_variant, VariantTag::Original);
    assert_eq!(selected.config_name, None);
    assert_eq!(selected.confidence, Some(0.9));
}

#[test]
fn test_noise_only_yields_degraded_prefix() {
    let extractor = extractor(
        ScriptedBackend::classic("@@ ## $$ %% ^^ && ** !!", "|"),
        ScriptedBackend::neural(vec![]),
    );

    let analysis = extractor.extract_image(&blank_image());
    assert_eq!(analysis.outcome, ExtractionOutcome::DegradedQuality);
    assert!(analysis.combined_text.starts_with(DEGRADED_PREFIX));
    assert!(analysis.combined_text.contains("extraction quality is poor"));
    assert!(analysis.combined_text.ends_with("@@ ## $$ %% ^^ && ** !!..."));
}

#[test]
fn test_selected_text_is_normalized() {
    let extractor = extractor(
        ScriptedBackend::classic("  First line of the letter  \nx\n\n  Second line here ", ""),
        ScriptedBackend::neural(vec![]),
    );

    let analysis = extractor.extract_image(&blank_image());
    assert_eq!(analysis.outcome, ExtractionOutcome::Ok);
    assert_eq!(
        analysis.combined_text,
        "First line of the letter\nSecond line here"
    );
}

#[test]
fn test_end_to_end_provenance() {
    let temp = TempDir::new().unwrap();
    let path = write_blank_png(temp.path(), "hello.PNG");

    let extractor = extractor(
        ScriptedBackend::classic("Hello World 123456789", ""),
        ScriptedBackend::neural(vec!["Hello World", "123456789"]),
    );

    let result = extractor.extract(&path, OutputMode::Detailed).unwrap();
    assert_eq!(result.text(), "Hello World 123456789");

    let ExtractionReport::Image(image) = result.into_report().unwrap() else {
        panic!("expected an image report");
    };
    assert_eq!(image.file_hash.len(), 64);
    assert_eq!(image.analysis.variants, VariantTag::ALL.to_vec());
    assert_eq!(
        image.analysis.classic_results["version_3"]["default"],
        "Hello World 123456789"
    );
    assert_eq!(
        image.analysis.neural_results["version_1"],
        "Hello World 123456789"
    );

    let backends: Vec<OcrBackendType> = image
        .analysis
        .attempts
        .iter()
        .filter(|a| a.text == "Hello World 123456789")
        .map(|a| a.provenance.backend)
        .collect();
    assert!(backends.contains(&OcrBackendType::Tesseract));
    assert!(backends.contains(&OcrBackendType::PaddleOcr));

    // Equal candidates tie-break to the first variant and the classic backend
    let selected = image.analysis.selected.unwrap();
    assert_eq!(selected.variant_index, 0);
    assert_eq!(selected.backend, OcrBackendType::Tesseract);
    assert_eq!(selected.config_name.as_deref(), Some("default"));
}

#[test]
fn test_pdf_routes_sparse_pages_to_ocr() {
    let extractor = extractor(
        ScriptedBackend::classic("Scanned page text recovered by OCR", ""),
        ScriptedBackend::neural(vec![]),
    );
    let page_one = "This page has plenty of embedded text, well over the fifty character mark.";
    let pdf = FakePdf::new(vec![page_one, "Page 2 abc"]);

    let result = extractor.extract_pdf(&pdf);
    assert_eq!(*pdf.rendered.borrow(), vec![2]);
    assert_eq!(result.page_count, 2);

    assert!(!result.pages[0].used_ocr());
    assert!(result.pages[0].ocr_text.is_empty());
    assert!(result.pages[1].used_ocr());
    assert_eq!(
        result.pages[1].ocr_text,
        "Scanned page text recovered by OCR"
    );

    // Direct text wins when any page has it
    assert_eq!(result.combined_text, format!("{}\nPage 2 abc", page_one));
    assert_eq!(result.outcome, ExtractionOutcome::Ok);
}

#[test]
fn test_pdf_without_embedded_text_uses_ocr() {
    let extractor = extractor(
        ScriptedBackend::classic("Scanned page text recovered by OCR", ""),
        ScriptedBackend::neural(vec![]),
    );
    let pdf = FakePdf::new(vec!["", "   \n  "]);

    let result = extractor.extract_pdf(&pdf);
    assert_eq!(*pdf.rendered.borrow(), vec![1, 2]);
    assert_eq!(
        result.combined_text,
        "Scanned page text recovered by OCR\nScanned page text recovered by OCR"
    );
    assert_eq!(result.ocr_text, result.combined_text);
    assert_eq!(result.outcome, ExtractionOutcome::Ok);
}

#[test]
fn test_pdf_page_failure_does_not_abort() {
    let extractor = extractor(
        ScriptedBackend::classic("Scanned page text recovered by OCR", ""),
        ScriptedBackend::neural(vec![]),
    );
    let mut pdf = FakePdf::new(vec!["", "", ""]);
    pdf.broken_renders = vec![2];

    let result = extractor.extract_pdf(&pdf);
    assert_eq!(*pdf.rendered.borrow(), vec![1, 2, 3]);
    assert_eq!(result.pages.len(), 3);
    assert!(result.pages[1].ocr_text.is_empty());
    assert!(!result.pages[1].used_ocr());
    assert_eq!(
        result.pages[2].ocr_text,
        "Scanned page text recovered by OCR"
    );
}

#[test]
fn test_pdf_with_nothing_is_empty() {
    let extractor = TextExtractor::new(BackendRegistry::empty(), ExtractorConfig::default());
    let pdf = FakePdf::new(vec![]);

    let result = extractor.extract_pdf(&pdf);
    assert_eq!(result.page_count, 0);
    assert!(result.combined_text.is_empty());
    assert_eq!(result.outcome, ExtractionOutcome::Empty);
}

#[test]
fn test_expired_deadline_skips_ocr() {
    let registry = BackendRegistry::empty().with_backend(
        BackendKind::Classic,
        ScriptedBackend::classic("Hello World 123456789", ""),
    );
    let config = ExtractorConfig {
        deadline_secs: Some(0),
        ..ExtractorConfig::default()
    };
    let extractor = TextExtractor::new(registry, config);

    let analysis = extractor.extract_image(&blank_image());
    assert!(analysis.attempts.is_empty());
    assert_eq!(analysis.combined_text, EMPTY_SENTINEL);
}

#[test]
fn test_missing_file() {
    let temp = TempDir::new().unwrap();
    let extractor = TextExtractor::new(BackendRegistry::empty(), ExtractorConfig::default());

    for name in ["missing.png", "missing.docx"] {
        let result = extractor.extract(&temp.path().join(name), OutputMode::Plain);
        assert!(matches!(result, Err(ExtractError::FileNotFound(_))), "{}", name);
    }
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("notes.txt");
    std::fs::write(&path, "plain text").unwrap();

    let extractor = TextExtractor::new(BackendRegistry::empty(), ExtractorConfig::default());
    let result = extractor.extract(&path, OutputMode::Plain);
    assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
}

#[test]
fn test_undecodable_image() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.png");
    std::fs::write(&path, b"this is not an image at all").unwrap();

    let extractor = TextExtractor::new(BackendRegistry::empty(), ExtractorConfig::default());
    let result = extractor.extract(&path, OutputMode::Plain);
    assert!(matches!(result, Err(ExtractError::Decode { .. })));
}
