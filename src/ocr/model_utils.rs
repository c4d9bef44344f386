//! Shared utilities for OCR backends.
//!
//! Provides common functionality for:
//! - Downloading and locating OCR models
//! - Checking for CLI tool availability

// Model helpers are only used when the ocr-paddle feature is enabled
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use super::backend::OcrError;

/// Environment variable holding an optional SOCKS proxy for model downloads.
pub const SOCKS_PROXY_ENV: &str = "SOCKS_PROXY";

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Model file specification for downloading.
pub struct ModelSpec {
    /// URL to download from.
    pub url: &'static str,
    /// Filename to save as.
    pub filename: &'static str,
    /// Human-readable size for progress messages.
    pub size_hint: &'static str,
}

/// Configuration for model directory management.
pub struct ModelDirConfig {
    /// Subdirectory name under data_dir (e.g., "paddle-ocr").
    pub subdir: &'static str,
    /// Required model files to check for presence.
    pub required_files: &'static [&'static str],
}

impl ModelDirConfig {
    /// Get the default model directory for this backend.
    pub fn default_dir(&self) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("ocrsift")
            .join(self.subdir)
    }

    /// Get standard candidate directories to search for models.
    pub fn candidate_dirs(&self) -> Vec<PathBuf> {
        [
            Some(self.default_dir()),
            dirs::home_dir().map(|d| d.join(format!(".{}", self.subdir)).join("models")),
            Some(PathBuf::from(format!("/usr/share/{}/models", self.subdir))),
            Some(PathBuf::from(format!(
                "./models/{}",
                self.subdir.split('-').next().unwrap_or(self.subdir)
            ))),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Check if a directory contains all required model files.
    pub fn has_required_files(&self, dir: &Path) -> bool {
        self.required_files
            .iter()
            .all(|file| dir.join(file).exists())
    }
}

/// Download a file from a URL to a local path using curl or wget.
/// Respects SOCKS_PROXY for routing the download.
pub fn download_file(url: &str, dest: &Path) -> Result<(), OcrError> {
    let socks_proxy = std::env::var(SOCKS_PROXY_ENV)
        .ok()
        .filter(|p| !p.is_empty());

    let mut curl_cmd = Command::new("curl");
    curl_cmd.args(["-fsSL", "-o"]);
    curl_cmd.arg(dest);
    curl_cmd.arg(url);

    if let Some(ref proxy) = socks_proxy {
        curl_cmd.args(["--proxy", proxy]);
        if proxy.starts_with("socks5://") {
            warn!("Use socks5h:// instead of socks5:// to resolve DNS through the proxy");
        }
    }

    match curl_cmd.status() {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => {
            let _ = std::fs::remove_file(dest);
            Err(OcrError::OcrFailed(format!("Failed to download {}", url)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut wget_cmd = Command::new("wget");
            wget_cmd.args(["-q", "-O"]);
            wget_cmd.arg(dest);
            wget_cmd.arg(url);

            // wget has no SOCKS flag; builds with proxy support read these
            if let Some(ref proxy) = socks_proxy {
                wget_cmd.env("http_proxy", proxy);
                wget_cmd.env("https_proxy", proxy);
            }

            match wget_cmd.status() {
                Ok(status) if status.success() => Ok(()),
                Ok(_) => {
                    let _ = std::fs::remove_file(dest);
                    Err(OcrError::OcrFailed(format!("Failed to download {}", url)))
                }
                Err(_) => Err(OcrError::BackendNotAvailable(
                    "Neither curl nor wget found. Install one to download models.".to_string(),
                )),
            }
        }
        Err(e) => Err(OcrError::Io(e)),
    }
}

/// Download a model file if it doesn't exist.
pub fn ensure_model_file(spec: &ModelSpec, model_dir: &Path) -> Result<(), OcrError> {
    let dest = model_dir.join(spec.filename);
    if !dest.exists() {
        info!("Downloading {} (~{})", spec.filename, spec.size_hint);
        download_file(spec.url, &dest)?;
        info!("Downloaded {}", spec.filename);
    }
    Ok(())
}

/// Find model directory by checking config path first, then standard locations.
pub fn find_model_dir(
    config_path: Option<&PathBuf>,
    model_config: &ModelDirConfig,
) -> Option<PathBuf> {
    if let Some(path) = config_path {
        if model_config.has_required_files(path) {
            return Some(path.clone());
        }
    }

    model_config
        .candidate_dirs()
        .into_iter()
        .find(|dir| model_config.has_required_files(dir))
}

/// Ensure models are present, downloading if necessary.
pub fn ensure_models_present(
    config_path: Option<&PathBuf>,
    model_config: &ModelDirConfig,
    model_specs: &[&ModelSpec],
) -> Result<PathBuf, OcrError> {
    if let Some(dir) = find_model_dir(config_path, model_config) {
        return Ok(dir);
    }

    let model_dir = config_path
        .cloned()
        .unwrap_or_else(|| model_config.default_dir());
    std::fs::create_dir_all(&model_dir).map_err(OcrError::Io)?;

    for spec in model_specs {
        ensure_model_file(spec, &model_dir)?;
    }

    Ok(model_dir)
}

/// Format availability hint for a model-based backend.
pub fn model_availability_hint(
    config_path: Option<&PathBuf>,
    model_config: &ModelDirConfig,
    backend_name: &str,
    total_size: &str,
) -> String {
    match find_model_dir(config_path, model_config) {
        Some(path) => format!("{} models found at {:?}", backend_name, path),
        None => format!(
            "{} models will be auto-downloaded on first use (~{}) to {:?}",
            backend_name,
            total_size,
            config_path
                .cloned()
                .unwrap_or_else(|| model_config.default_dir())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_CONFIG: ModelDirConfig = ModelDirConfig {
        subdir: "test-models",
        required_files: &["det.onnx", "rec.onnx"],
    };

    #[test]
    fn test_has_required_files() {
        let temp = TempDir::new().unwrap();
        assert!(!TEST_CONFIG.has_required_files(temp.path()));

        std::fs::write(temp.path().join("det.onnx"), b"x").unwrap();
        assert!(!TEST_CONFIG.has_required_files(temp.path()));

        std::fs::write(temp.path().join("rec.onnx"), b"x").unwrap();
        assert!(TEST_CONFIG.has_required_files(temp.path()));
    }

    #[test]
    fn test_find_model_dir_prefers_config_path() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("det.onnx"), b"x").unwrap();
        std::fs::write(temp.path().join("rec.onnx"), b"x").unwrap();

        let configured = temp.path().to_path_buf();
        let found = find_model_dir(Some(&configured), &TEST_CONFIG);
        assert_eq!(found, Some(configured));
    }

    #[test]
    fn test_model_hint_mentions_download_when_missing() {
        let temp = TempDir::new().unwrap();
        let configured = temp.path().join("empty");
        let hint = model_availability_hint(Some(&configured), &TEST_CONFIG, "Test", "1 MB");
        assert!(hint.contains("auto-downloaded"));
    }

    #[test]
    fn test_check_binary_missing() {
        assert!(!check_binary("definitely-not-a-real-binary-ocrsift"));
    }
}
