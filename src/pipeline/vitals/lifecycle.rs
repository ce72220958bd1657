use std::fmt;

use thiserror::Error;

/// Stage of a single vitals upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Idle,
    Reading,
    Encoding,
    Requesting,
    Parsing,
    Merging,
    Persisting,
    Done,
    /// Carries the [`ExtractionError::kind`](super::ExtractionError::kind) code.
    Error(&'static str),
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Encoding => "encoding",
            Self::Requesting => "requesting",
            Self::Parsing => "parsing",
            Self::Merging => "merging",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    /// The only stage that may follow this one on the success path.
    fn successor(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Reading),
            Self::Reading => Some(Self::Encoding),
            Self::Encoding => Some(Self::Requesting),
            Self::Requesting => Some(Self::Parsing),
            Self::Parsing => Some(Self::Merging),
            Self::Merging => Some(Self::Persisting),
            Self::Persisting => Some(Self::Done),
            Self::Done | Self::Error(_) => None,
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(kind) => write!(f, "error({kind})"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid upload transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: UploadStage,
    pub to: UploadStage,
}

/// Strictly sequential upload state machine.
///
/// Every accepted transition is reported to the observer.
pub struct UploadLifecycle<F: FnMut(&UploadStage)> {
    stage: UploadStage,
    observer: F,
}

impl<F: FnMut(&UploadStage)> UploadLifecycle<F> {
    pub fn new(observer: F) -> Self {
        Self {
            stage: UploadStage::Idle,
            observer,
        }
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    /// Move to `next`, which must be the direct successor of the current stage.
    pub fn advance(&mut self, next: UploadStage) -> Result<(), InvalidTransition> {
        if self.stage.successor() != Some(next) {
            return Err(InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.enter(next);
        Ok(())
    }

    /// Abort into `Error(kind)`. Allowed from any non-terminal stage after `Idle`.
    pub fn fail(&mut self, kind: &'static str) -> Result<(), InvalidTransition> {
        let next = UploadStage::Error(kind);
        if self.stage == UploadStage::Idle || self.stage.is_terminal() {
            return Err(InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.enter(next);
        Ok(())
    }

    fn enter(&mut self, next: UploadStage) {
        tracing::debug!(from = %self.stage, to = %next, "Upload stage");
        self.stage = next;
        (self.observer)(&self.stage);
    }
}
