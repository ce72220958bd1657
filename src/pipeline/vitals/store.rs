//! Persistence seam for the upload pipeline.

use std::path::PathBuf;

use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::VitalReading;

/// The two store operations an upload needs.
pub trait VitalStore: Send + Sync {
    /// Most recent reading for the patient by `taken_at`, if any.
    fn latest_reading(&self, patient_id: &Uuid) -> Result<Option<VitalReading>, DatabaseError>;

    /// Append a new reading. Existing rows are never updated.
    fn insert_reading(&self, reading: &VitalReading) -> Result<(), DatabaseError>;
}

/// SQLite-backed store. Opens a connection per call.
pub struct SqliteVitalStore {
    db_path: PathBuf,
}

impl SqliteVitalStore {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

impl VitalStore for SqliteVitalStore {
    fn latest_reading(&self, patient_id: &Uuid) -> Result<Option<VitalReading>, DatabaseError> {
        let conn = db::open_database(&self.db_path)?;
        db::get_latest_vital_reading(&conn, patient_id)
    }

    fn insert_reading(&self, reading: &VitalReading) -> Result<(), DatabaseError> {
        let conn = db::open_database(&self.db_path)?;
        db::insert_vital_reading(&conn, reading)
    }
}

/// In-memory store for pipeline tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryVitalStore {
    readings: std::sync::Mutex<Vec<VitalReading>>,
}

#[cfg(test)]
impl MemoryVitalStore {
    pub fn with_prior(reading: VitalReading) -> Self {
        Self {
            readings: std::sync::Mutex::new(vec![reading]),
        }
    }

    pub fn readings(&self) -> Vec<VitalReading> {
        self.readings.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl VitalStore for MemoryVitalStore {
    fn latest_reading(&self, patient_id: &Uuid) -> Result<Option<VitalReading>, DatabaseError> {
        let readings = self.readings.lock().unwrap();
        Ok(readings
            .iter()
            .filter(|r| r.patient_id == *patient_id)
            .max_by_key(|r| r.taken_at)
            .cloned())
    }

    fn insert_reading(&self, reading: &VitalReading) -> Result<(), DatabaseError> {
        self.readings.lock().unwrap().push(reading.clone());
        Ok(())
    }
}
