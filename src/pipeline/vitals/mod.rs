//! Vital-sign extraction from monitor photos.
//!
//! Flow: image bytes → [`VisionRequest`](crate::pipeline::vision::VisionRequest)
//! → vision model → [`parser`] → [`reconcile`] with the prior reading → [`store`].
//! [`upload::VitalsUploader`] drives the whole sequence and reports progress
//! through [`lifecycle::UploadStage`].

pub mod extractor;
pub mod lifecycle;
pub mod locks;
pub mod parser;
pub mod reconcile;
pub mod store;
pub mod upload;
pub mod vocabulary;

pub use extractor::VitalsExtractor;
pub use lifecycle::{UploadLifecycle, UploadStage};
pub use locks::PatientLocks;
pub use parser::{parse_response, parse_positional, parse_strict, strip_code_fences};
pub use reconcile::merge_with_prior;
pub use store::{SqliteVitalStore, VitalStore};
pub use upload::{ImageInput, UploadOutcome, VitalsUploader};
pub use vocabulary::{CanonicalField, Vocabulary};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No image data provided: {0}")]
    MissingInput(String),

    #[error("Vision model call failed: {0}")]
    UpstreamCallFailure(String),

    #[error("Vision model returned an unparseable response ({} chars)", .raw.len())]
    MalformedResponse { raw: String },

    #[error("Failed to store vital reading: {0}")]
    PersistenceFailure(String),
}

impl ExtractionError {
    /// Stable machine-readable kind, used as the API error code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::UpstreamCallFailure(_) => "UPSTREAM_CALL_FAILURE",
            Self::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            Self::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
        }
    }
}

impl From<crate::pipeline::vision::VisionError> for ExtractionError {
    fn from(err: crate::pipeline::vision::VisionError) -> Self {
        Self::UpstreamCallFailure(err.to_string())
    }
}

impl From<crate::db::DatabaseError> for ExtractionError {
    fn from(err: crate::db::DatabaseError) -> Self {
        Self::PersistenceFailure(err.to_string())
    }
}

/// How model output is turned into fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionMode {
    /// JSON object keyed by the monitor vocabulary.
    #[default]
    Strict,
    /// Digit runs assigned in legacy order. Lossy: a reordered or partial
    /// readout shifts every later field.
    Positional,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Positional => "positional",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "positional" => Some(Self::Positional),
            _ => None,
        }
    }

    /// Vocabulary whose instruction and key table this mode uses.
    pub fn vocabulary(&self) -> Vocabulary {
        match self {
            Self::Strict => Vocabulary::Monitor,
            Self::Positional => Vocabulary::Legacy,
        }
    }
}
