//! Candidate aggregation across variants and backends.
//!
//! The classic backend runs every profile against every variant; the
//! neural backend only sees the original and threshold variants since it
//! is much slower. Every attempt is recorded with its provenance, and the
//! non-empty ones become candidates for selection. Duplicate texts from
//! different sources are kept as independent candidates.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, error, warn};

use super::backend::{join_regions, BackendKind, OcrBackend, RecognitionProfile};
use super::deadline::Deadline;
use super::preprocess::{ImageVariant, ORIGINAL_INDEX, THRESHOLD_INDEX};
use super::registry::BackendRegistry;
use super::selection::SelectionConfig;
use super::types::{Candidate, Provenance};

/// Variants handed to the neural backend, in order.
pub const NEURAL_VARIANTS: [usize; 2] = [ORIGINAL_INDEX, THRESHOLD_INDEX];

/// Everything gathered for one image.
#[derive(Debug, Clone, Default)]
pub struct CandidateCollection {
    /// Non-empty texts, in collection order.
    pub candidates: Vec<Candidate>,
    /// Every attempt, including empty and failed ones.
    pub attempts: Vec<Candidate>,
    /// Classic results keyed by `version_<variant index>`, then by profile name.
    pub classic_results: BTreeMap<String, BTreeMap<String, String>>,
    /// Neural results keyed by `version_<n>` over [`NEURAL_VARIANTS`].
    pub neural_results: BTreeMap<String, String>,
}

impl CandidateCollection {
    fn record(&mut self, candidate: Candidate) {
        if !candidate.text.trim().is_empty() {
            self.candidates.push(candidate.clone());
        }
        self.attempts.push(candidate);
    }
}

/// Run all applicable backends over the variants.
pub fn collect_candidates(
    variants: &[ImageVariant],
    registry: &BackendRegistry,
    selection: &SelectionConfig,
    deadline: &Deadline,
) -> CandidateCollection {
    let mut collection = CandidateCollection::default();

    if let Some(classic) = registry.get(BackendKind::Classic) {
        for (index, variant) in variants.iter().enumerate() {
            let mut by_profile = BTreeMap::new();
            for profile in classic.profiles() {
                if deadline.expired() {
                    warn!(
                        "Deadline reached after {:?}, skipping {} {} on variant {}",
                        deadline.elapsed(),
                        classic.backend_type(),
                        profile.name,
                        variant.tag
                    );
                    continue;
                }

                let candidate =
                    run_attempt(classic.as_ref(), index, variant, profile, selection, true);
                by_profile.insert(profile.name.to_string(), candidate.text.clone());
                collection.record(candidate);
            }
            collection
                .classic_results
                .insert(format!("version_{}", index), by_profile);
        }
    }

    if let Some(neural) = registry.get(BackendKind::Neural) {
        for (slot, &index) in NEURAL_VARIANTS.iter().enumerate() {
            let Some(variant) = variants.get(index) else {
                continue;
            };
            if deadline.expired() {
                warn!(
                    "Deadline reached after {:?}, skipping {} on variant {}",
                    deadline.elapsed(),
                    neural.backend_type(),
                    variant.tag
                );
                continue;
            }

            let profile = neural
                .profiles()
                .first()
                .copied()
                .unwrap_or(RecognitionProfile::DEFAULT);
            let candidate = run_attempt(neural.as_ref(), index, variant, &profile, selection, false);
            collection
                .neural_results
                .insert(format!("version_{}", slot), candidate.text.clone());
            collection.record(candidate);
        }
    }

    debug!(
        "Collected {} candidates from {} attempts",
        collection.candidates.len(),
        collection.attempts.len()
    );
    collection
}

/// One backend call. Failures are logged and produce an empty attempt.
fn run_attempt(
    backend: &dyn OcrBackend,
    variant_index: usize,
    variant: &ImageVariant,
    profile: &RecognitionProfile,
    selection: &SelectionConfig,
    record_profile: bool,
) -> Candidate {
    let start = Instant::now();
    let (text, confidence) = match backend.recognize(&variant.image, profile) {
        Ok(regions) => {
            let (text, confidence) = join_regions(&regions, selection.confidence_floor);
            (text.trim().to_string(), confidence)
        }
        Err(e) => {
            error!(
                backend = %backend.backend_type(),
                profile = profile.name,
                variant = %variant.tag,
                "OCR attempt failed: {}",
                e
            );
            (String::new(), None)
        }
    };

    Candidate {
        text,
        provenance: Provenance {
            variant_index,
            source_variant: variant.tag,
            backend: backend.backend_type(),
            config_name: record_profile.then(|| profile.name.to_string()),
            confidence,
            processing_time_ms: start.elapsed().as_millis() as u64,
        },
    }
}
