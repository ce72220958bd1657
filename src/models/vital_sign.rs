use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five charted vital values.
///
/// All fields are non-negative integers. A value that could not be read is
/// stored as 0, never as null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalValues {
    /// mmHg
    pub systolic_bp: u32,
    /// mmHg
    pub diastolic_bp: u32,
    /// mg/dL
    pub blood_sugar: u32,
    /// mL
    pub fluid_input: u32,
    /// mL
    pub fluid_output: u32,
}

/// One timestamped snapshot of a patient's vital signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalReading {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[serde(flatten)]
    pub values: VitalValues,
    pub taken_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl VitalReading {
    /// New reading taken now.
    pub fn new(patient_id: Uuid, values: VitalValues) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            values,
            taken_at: now,
            created_at: now,
        }
    }
}

/// Readouts a vocabulary may provide beyond the charted OCR fields.
///
/// Reported back to callers, never merged into a stored reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementaryReadout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fluid_input: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fluid_output: Option<u32>,
}

/// Vital fields read from a monitor photo, in the canonical internal schema.
///
/// Transient: produced per upload, merged with the prior reading, then dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub systolic_bp: u32,
    pub diastolic_bp: u32,
    pub blood_sugar: u32,
    #[serde(flatten)]
    pub supplementary: SupplementaryReadout,
}

impl ExtractionResult {
    /// True when the model found nothing it could read.
    pub fn is_empty(&self) -> bool {
        self.systolic_bp == 0 && self.diastolic_bp == 0 && self.blood_sugar == 0
    }
}
