//! PaddleOCR backend implementation.
//!
//! Uses paddle-ocr-rs for OCR via ONNX Runtime. This is the neural
//! backend: slower than Tesseract but better on handwriting, and it
//! reports a confidence score for every detected text region.
//!
//! Models are automatically downloaded on first use from:
//! https://github.com/RapidAI/RapidOCR

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use image::DynamicImage;
use paddle_ocr_rs::ocr_lite::OcrLite;
use tempfile::TempDir;
use tracing::info;

use super::backend::{
    BoundingBox, OcrBackend, OcrBackendType, OcrError, RecognitionProfile, TextRegion,
};
use super::model_utils::{
    ensure_models_present, find_model_dir, model_availability_hint, ModelDirConfig, ModelSpec,
};

/// Global cached OcrLite instance (initialized once, reused for all OCR calls).
/// detect_from_path needs &mut self, so calls are serialized through the Mutex.
static OCR_ENGINE: OnceLock<Mutex<OcrLite>> = OnceLock::new();

/// Model directory configuration for PaddleOCR.
const MODEL_CONFIG: ModelDirConfig = ModelDirConfig {
    subdir: "paddle-ocr",
    required_files: &[DET_MODEL_NAME, REC_MODEL_NAME, CLS_MODEL_NAME],
};

const DET_MODEL_NAME: &str = "ch_PP-OCRv4_det_infer.onnx";
const REC_MODEL_NAME: &str = "ch_PP-OCRv4_rec_infer.onnx";
const CLS_MODEL_NAME: &str = "ch_ppocr_mobile_v2.0_cls_infer.onnx";

const DET_MODEL: ModelSpec = ModelSpec {
    url: "https://huggingface.co/SWHL/RapidOCR/resolve/main/PP-OCRv4/ch_PP-OCRv4_det_infer.onnx",
    filename: DET_MODEL_NAME,
    size_hint: "4 MB",
};

const REC_MODEL: ModelSpec = ModelSpec {
    url: "https://huggingface.co/SWHL/RapidOCR/resolve/main/PP-OCRv4/ch_PP-OCRv4_rec_infer.onnx",
    filename: REC_MODEL_NAME,
    size_hint: "10 MB",
};

const CLS_MODEL: ModelSpec = ModelSpec {
    url: "https://www.modelscope.cn/models/RapidAI/RapidOCR/resolve/v3.4.0/onnx/PP-OCRv4/cls/ch_ppocr_mobile_v2.0_cls_infer.onnx",
    filename: CLS_MODEL_NAME,
    size_hint: "1 MB",
};

/// Inference threads handed to ONNX Runtime.
const NUM_THREADS: usize = 4;

/// PaddleOCR backend via ONNX Runtime.
pub struct PaddleBackend {
    model_path: Option<PathBuf>,
}

impl PaddleBackend {
    /// Create a new PaddleOCR backend using the standard model locations.
    pub fn new() -> Self {
        Self { model_path: None }
    }

    /// Create a backend that loads (or downloads) models into a specific directory.
    pub fn with_model_path(model_path: Option<PathBuf>) -> Self {
        Self { model_path }
    }

    fn model_paths(&self) -> Result<(String, String, String), OcrError> {
        let model_dir = ensure_models_present(
            self.model_path.as_ref(),
            &MODEL_CONFIG,
            &[&DET_MODEL, &REC_MODEL, &CLS_MODEL],
        )?;

        let path_of = |name: &str| model_dir.join(name).to_string_lossy().to_string();
        if !MODEL_CONFIG.has_required_files(&model_dir) {
            return Err(OcrError::ModelNotFound(format!(
                "PaddleOCR models missing from {:?}",
                model_dir
            )));
        }

        Ok((
            path_of(DET_MODEL_NAME),
            path_of(CLS_MODEL_NAME),
            path_of(REC_MODEL_NAME),
        ))
    }

    /// Get or initialize the cached OCR engine.
    fn get_or_init_engine(&self) -> Result<&'static Mutex<OcrLite>, OcrError> {
        if let Some(engine) = OCR_ENGINE.get() {
            return Ok(engine);
        }

        let (det_model, cls_model, rec_model) = self.model_paths()?;

        let mut ocr = OcrLite::new();
        ocr.init_models(&det_model, &cls_model, &rec_model, NUM_THREADS)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to init PaddleOCR: {}", e)))?;
        info!("PaddleOCR engine initialized");

        // If another thread beat us, its engine wins
        let _ = OCR_ENGINE.set(Mutex::new(ocr));

        OCR_ENGINE
            .get()
            .ok_or_else(|| OcrError::OcrFailed("Failed to cache OCR engine".to_string()))
    }

    /// Run detection + recognition on an image file.
    fn run_paddle(&self, image_path: &Path) -> Result<Vec<TextRegion>, OcrError> {
        let engine_mutex = self.get_or_init_engine()?;
        let mut ocr = engine_mutex
            .lock()
            .map_err(|e| OcrError::OcrFailed(format!("Failed to lock OCR engine: {}", e)))?;

        let result = ocr
            .detect_from_path(
                image_path.to_str().unwrap_or(""),
                50,    // padding
                1024,  // max side length
                0.5,   // box score threshold
                0.3,   // box threshold
                1.6,   // unclip ratio
                false, // do angle
                false, // most angle
            )
            .map_err(|e| OcrError::OcrFailed(format!("PaddleOCR detection failed: {}", e)))?;

        Ok(result
            .text_blocks
            .iter()
            .map(|block| TextRegion {
                text: block.text.clone(),
                confidence: Some(block.text_score),
                bbox: Some(BoundingBox {
                    points: block
                        .box_points
                        .iter()
                        .map(|p| (p.x as f32, p.y as f32))
                        .collect(),
                }),
            })
            .collect())
    }
}

impl Default for PaddleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for PaddleBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::PaddleOcr
    }

    fn is_available(&self) -> bool {
        // Models are auto-downloaded on first use
        true
    }

    fn availability_hint(&self) -> String {
        model_availability_hint(
            self.model_path.as_ref(),
            &MODEL_CONFIG,
            "PaddleOCR",
            "15 MB",
        )
    }

    fn initialize(&self) -> Result<(), OcrError> {
        if find_model_dir(self.model_path.as_ref(), &MODEL_CONFIG).is_none() {
            info!("PaddleOCR models not found locally, downloading");
        }
        self.get_or_init_engine().map(|_| ())
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        _profile: &RecognitionProfile,
    ) -> Result<Vec<TextRegion>, OcrError> {
        // detect_from_path expects a 3-channel image on disk
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("variant.png");
        DynamicImage::ImageRgb8(image.to_rgb8())
            .save(&image_path)
            .map_err(|e| OcrError::ImageError(format!("Failed to stage image: {}", e)))?;

        self.run_paddle(&image_path)
    }
}
