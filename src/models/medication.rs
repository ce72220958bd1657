use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medication scheduled for a patient, with its administration flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub taken_at: NaiveDateTime,
    pub is_administered: bool,
    pub created_at: NaiveDateTime,
}

impl Medication {
    pub fn new(patient_id: Uuid, name: &str) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            name: name.trim().to_string(),
            taken_at: now,
            is_administered: false,
            created_at: now,
        }
    }
}
