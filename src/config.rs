//! Configuration for the extraction pipeline.
//!
//! Every field has a default, so an empty file (or no file at all) gives
//! the stock pipeline. Files are TOML or JSON, chosen by extension.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::SelectionConfig;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "OCRSIFT_CONFIG";

/// Pages with less embedded text than this (trimmed, in characters) are OCR'd.
pub const DIRECT_TEXT_MIN_LEN: usize = 50;

/// Page rasterization zoom over the 72 DPI base.
pub const DEFAULT_PDF_ZOOM: f32 = 2.0;

/// Default Tesseract language.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which OCR backends the registry should try to bring up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Classic backend (Tesseract CLI).
    pub tesseract: bool,
    /// Neural backend (PaddleOCR); ignored unless built with `ocr-paddle`.
    pub paddle: bool,
    /// Directory holding the PaddleOCR models. Defaults to the data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            tesseract: true,
            paddle: true,
            model_path: None,
        }
    }
}

/// Extraction pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    pub selection: SelectionConfig,
    pub direct_text_min_len: usize,
    pub pdf_zoom: f32,
    /// Soft per-call time budget in seconds. Unset means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
    pub backends: BackendSettings,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            selection: SelectionConfig::default(),
            direct_text_min_len: DIRECT_TEXT_MIN_LEN,
            pdf_zoom: DEFAULT_PDF_ZOOM,
            deadline_secs: None,
            backends: BackendSettings::default(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `OCRSIFT_CONFIG` is
    /// consulted; if that is unset too, defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_ENV_VAR)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from_path(&path),
            None => {
                tracing::debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

        let config = match ext {
            "json" => Self::from_json_str(&contents)?,
            _ => Self::from_toml_str(&contents)?,
        };

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language.trim().is_empty() {
            return Err(ConfigError::Invalid("language must not be empty".to_string()));
        }
        if !(self.pdf_zoom.is_finite() && self.pdf_zoom > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "pdf_zoom must be positive, got {}",
                self.pdf_zoom
            )));
        }
        let ratio = self.selection.meaningful_ratio;
        if !(0.0..1.0).contains(&ratio) {
            return Err(ConfigError::Invalid(format!(
                "selection.meaningful_ratio must be in [0, 1), got {}",
                ratio
            )));
        }
        Ok(())
    }

    /// Per-call time budget.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}
