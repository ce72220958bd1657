use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// Idle entries are pruned once the table grows past this size.
const PRUNE_THRESHOLD: usize = 256;

/// One mutual-exclusion scope per patient.
///
/// Serializes read-prior → merge → insert for a patient while uploads for
/// different patients run concurrently.
#[derive(Default)]
pub struct PatientLocks {
    entries: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl PatientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, patient_id: &Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if entries.len() >= PRUNE_THRESHOLD {
            entries.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        entries.entry(*patient_id).or_default().clone()
    }

    /// Acquire the patient's lock from a blocking thread.
    ///
    /// Must not be called from async code; use [`lock`](Self::lock) there.
    pub fn lock_blocking(&self, patient_id: &Uuid) -> OwnedMutexGuard<()> {
        self.entry(patient_id).blocking_lock_owned()
    }

    pub async fn lock(&self, patient_id: &Uuid) -> OwnedMutexGuard<()> {
        self.entry(patient_id).lock_owned().await
    }

    /// Number of patients with a lock entry.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
