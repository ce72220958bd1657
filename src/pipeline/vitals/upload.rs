//! End-to-end vitals upload: photo in, merged reading stored.

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine as _;
use serde::Serialize;
use uuid::Uuid;

use super::extractor::VitalsExtractor;
use super::lifecycle::{UploadLifecycle, UploadStage};
use super::locks::PatientLocks;
use super::reconcile::merge_with_prior;
use super::store::VitalStore;
use super::ExtractionError;
use crate::models::{ExtractionResult, VitalReading};

/// Where the photo comes from.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Raw bytes, sent as is (even when empty).
    Bytes(Vec<u8>),
    /// Base64 payload as posted by a browser. A `data:` prefix is tolerated.
    Base64(String),
    Path(PathBuf),
}

impl ImageInput {
    /// Resolve to raw image bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, ExtractionError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Base64(encoded) => decode_base64_image(&encoded),
            Self::Path(path) => std::fs::read(&path).map_err(|e| {
                ExtractionError::MissingInput(format!("cannot read {}: {e}", path.display()))
            }),
        }
    }
}

fn decode_base64_image(encoded: &str) -> Result<Vec<u8>, ExtractionError> {
    let trimmed = encoded.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(""),
        None => trimmed,
    };
    if payload.is_empty() {
        return Err(ExtractionError::MissingInput("image is empty".into()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ExtractionError::MissingInput(format!("image is not valid base64: {e}")))
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// The row that was stored.
    pub reading: VitalReading,
    /// What the model read, before merging.
    pub extracted: ExtractionResult,
}

// ──────────────────────────────────────────────
// VitalsUploader
// ──────────────────────────────────────────────

pub struct VitalsUploader {
    extractor: VitalsExtractor,
    store: Arc<dyn VitalStore>,
    locks: Arc<PatientLocks>,
}

impl VitalsUploader {
    pub fn new(
        extractor: VitalsExtractor,
        store: Arc<dyn VitalStore>,
        locks: Arc<PatientLocks>,
    ) -> Self {
        Self {
            extractor,
            store,
            locks,
        }
    }

    /// Run a full upload. Blocks: call from a blocking thread.
    pub fn upload(
        &self,
        patient_id: &Uuid,
        input: ImageInput,
    ) -> Result<UploadOutcome, ExtractionError> {
        self.upload_with_progress(patient_id, input, |_| {})
    }

    /// Run a full upload, reporting each stage change to `on_stage`.
    ///
    /// Any failure aborts the remaining stages; nothing is merged or stored.
    pub fn upload_with_progress<F>(
        &self,
        patient_id: &Uuid,
        input: ImageInput,
        on_stage: F,
    ) -> Result<UploadOutcome, ExtractionError>
    where
        F: FnMut(&UploadStage),
    {
        let _span = tracing::info_span!("vitals_upload", patient_id = %patient_id).entered();
        let start = std::time::Instant::now();

        let mut lifecycle = UploadLifecycle::new(on_stage);
        let outcome = self.run_stages(&mut lifecycle, patient_id, input);

        match &outcome {
            Ok(outcome) => tracing::info!(
                reading_id = %outcome.reading.id,
                elapsed_ms = %start.elapsed().as_millis(),
                "Vitals upload stored"
            ),
            Err(err) => {
                tracing::warn!(kind = err.kind(), stage = %lifecycle.stage(), "Vitals upload failed");
                if let Err(invalid) = lifecycle.fail(err.kind()) {
                    tracing::error!(%invalid, "Upload lifecycle out of order");
                }
            }
        }
        outcome
    }

    fn run_stages<F>(
        &self,
        lifecycle: &mut UploadLifecycle<F>,
        patient_id: &Uuid,
        input: ImageInput,
    ) -> Result<UploadOutcome, ExtractionError>
    where
        F: FnMut(&UploadStage),
    {
        enter(lifecycle, UploadStage::Reading);
        let image = input.into_bytes()?;

        enter(lifecycle, UploadStage::Encoding);
        let request = self.extractor.build_request(&image);

        enter(lifecycle, UploadStage::Requesting);
        let raw = self.extractor.request(&request)?;

        enter(lifecycle, UploadStage::Parsing);
        let extracted = self.extractor.parse(&raw)?;

        enter(lifecycle, UploadStage::Merging);
        let _guard = self.locks.lock_blocking(patient_id);
        let prior = self.store.latest_reading(patient_id)?;
        let values = merge_with_prior(&extracted, prior.as_ref());

        enter(lifecycle, UploadStage::Persisting);
        let reading = VitalReading::new(*patient_id, values);
        self.store.insert_reading(&reading)?;

        enter(lifecycle, UploadStage::Done);
        Ok(UploadOutcome { reading, extracted })
    }
}

fn enter<F: FnMut(&UploadStage)>(lifecycle: &mut UploadLifecycle<F>, next: UploadStage) {
    if let Err(invalid) = lifecycle.advance(next) {
        tracing::error!(%invalid, "Upload lifecycle out of order");
    }
}
