//! Registry of OCR backends by role.
//!
//! Each role (classic, neural) holds at most one backend. Backends are
//! constructed lazily on first use and only once: a backend that fails
//! to construct or initialize is logged and stays absent for the
//! lifetime of the registry.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use super::backend::{BackendKind, OcrBackend, OcrError};
use super::tesseract::TesseractBackend;
use crate::config::ExtractorConfig;

#[cfg(feature = "ocr-paddle")]
use super::paddle_backend::PaddleBackend;

/// Constructor for a backend, run at most once.
pub type BackendFactory = Box<dyn Fn() -> Result<Arc<dyn OcrBackend>, OcrError> + Send + Sync>;

#[derive(Default)]
struct BackendSlot {
    factory: Option<BackendFactory>,
    handle: OnceLock<Option<Arc<dyn OcrBackend>>>,
}

impl BackendSlot {
    fn ready(backend: Arc<dyn OcrBackend>) -> Self {
        let handle = OnceLock::new();
        let _ = handle.set(Some(backend));
        Self {
            factory: None,
            handle,
        }
    }

    fn lazy(factory: BackendFactory) -> Self {
        Self {
            factory: Some(factory),
            handle: OnceLock::new(),
        }
    }

    fn get(&self, kind: BackendKind) -> Option<&Arc<dyn OcrBackend>> {
        self.handle.get_or_init(|| self.activate(kind)).as_ref()
    }

    fn activate(&self, kind: BackendKind) -> Option<Arc<dyn OcrBackend>> {
        let Some(factory) = &self.factory else {
            debug!("No {} OCR backend configured", kind);
            return None;
        };

        let backend = match factory() {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Failed to construct {} OCR backend: {}", kind, e);
                return None;
            }
        };

        if !backend.is_available() {
            warn!(
                "{} OCR backend {} disabled: {}",
                kind,
                backend.backend_type(),
                backend.availability_hint()
            );
            return None;
        }

        if let Err(e) = backend.initialize() {
            warn!(
                "{} OCR backend {} failed to initialize, disabled: {}",
                kind,
                backend.backend_type(),
                e
            );
            return None;
        }

        info!("{} OCR backend {} ready", kind, backend.backend_type());
        Some(backend)
    }
}

/// Backends available to the extraction pipeline.
#[derive(Default)]
pub struct BackendRegistry {
    classic: BackendSlot,
    neural: BackendSlot,
}

impl BackendRegistry {
    /// Registry with no backends; every extraction yields the empty sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry built from configuration. Nothing is constructed until first use.
    pub fn detect(config: &ExtractorConfig) -> Self {
        let mut registry = Self::empty();

        if config.backends.tesseract {
            let language = config.language.clone();
            registry = registry.with_factory(
                BackendKind::Classic,
                Box::new(move || {
                    Ok(Arc::new(TesseractBackend::with_language(&language)) as Arc<dyn OcrBackend>)
                }),
            );
        }

        if config.backends.paddle {
            registry = registry.with_paddle(config);
        }

        registry
    }

    #[cfg(feature = "ocr-paddle")]
    fn with_paddle(self, config: &ExtractorConfig) -> Self {
        let model_path = config.backends.model_path.clone();
        self.with_factory(
            BackendKind::Neural,
            Box::new(move || {
                Ok(Arc::new(PaddleBackend::with_model_path(model_path.clone()))
                    as Arc<dyn OcrBackend>)
            }),
        )
    }

    #[cfg(not(feature = "ocr-paddle"))]
    fn with_paddle(self, _config: &ExtractorConfig) -> Self {
        debug!("PaddleOCR requested but not compiled (enable the ocr-paddle feature)");
        self
    }

    /// Install an already-constructed backend in a slot.
    pub fn with_backend(mut self, kind: BackendKind, backend: Arc<dyn OcrBackend>) -> Self {
        *self.slot_mut(kind) = BackendSlot::ready(backend);
        self
    }

    /// Install a lazily-run constructor in a slot.
    pub fn with_factory(mut self, kind: BackendKind, factory: BackendFactory) -> Self {
        *self.slot_mut(kind) = BackendSlot::lazy(factory);
        self
    }

    /// Backend for a role, constructing it on first call.
    pub fn get(&self, kind: BackendKind) -> Option<&Arc<dyn OcrBackend>> {
        self.slot(kind).get(kind)
    }

    /// Whether any role has a working backend.
    pub fn has_any(&self) -> bool {
        self.get(BackendKind::Classic).is_some() || self.get(BackendKind::Neural).is_some()
    }

    fn slot(&self, kind: BackendKind) -> &BackendSlot {
        match kind {
            BackendKind::Classic => &self.classic,
            BackendKind::Neural => &self.neural,
        }
    }

    fn slot_mut(&mut self, kind: BackendKind) -> &mut BackendSlot {
        match kind {
            BackendKind::Classic => &mut self.classic,
            BackendKind::Neural => &mut self.neural,
        }
    }
}
