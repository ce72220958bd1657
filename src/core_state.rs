//! Shared application state for the HTTP layer.
//!
//! Holds the resolved configuration and the explicit handles the vitals
//! pipeline needs. Nothing here is global: tests build a `CoreState` with
//! their own vision client and database path.

use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{self, DatabaseError};
use crate::pipeline::vision::VisionClient;
use crate::pipeline::vitals::{
    PatientLocks, SqliteVitalStore, VitalStore, VitalsExtractor, VitalsUploader,
};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: AppConfig,
    vision: Arc<dyn VisionClient>,
    store: Arc<dyn VitalStore>,
    locks: Arc<PatientLocks>,
}

impl CoreState {
    /// State backed by the SQLite database named in `config`.
    pub fn new(config: AppConfig, vision: Arc<dyn VisionClient>) -> Self {
        let store = Arc::new(SqliteVitalStore::new(config.database_path.clone()));
        Self::with_store(config, vision, store)
    }

    pub fn with_store(
        config: AppConfig,
        vision: Arc<dyn VisionClient>,
        store: Arc<dyn VitalStore>,
    ) -> Self {
        Self {
            config,
            vision,
            store,
            locks: Arc::new(PatientLocks::new()),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.config.database_path
    }

    /// Open a connection to the charting database. Migrations run on open.
    pub fn open_db(&self) -> Result<rusqlite::Connection, DatabaseError> {
        db::open_database(self.db_path())
    }

    /// Extractor using the configured model and mode.
    pub fn extractor(&self) -> VitalsExtractor {
        VitalsExtractor::new(
            self.vision.clone(),
            &self.config.vision_model,
            self.config.extraction_mode,
        )
    }

    /// Uploader sharing this state's store and per-patient locks.
    pub fn uploader(&self) -> VitalsUploader {
        VitalsUploader::new(self.extractor(), self.store.clone(), self.locks.clone())
    }
}
