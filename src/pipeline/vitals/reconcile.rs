use crate::models::{ExtractionResult, VitalReading, VitalValues};

/// Merge a fresh extraction with the patient's most recent reading.
///
/// OCR-covered fields take the extracted value when non-zero and otherwise
/// fall back to the prior. Fluid balance is never read from a photo and is
/// always carried forward. Supplementary readouts are not merged.
pub fn merge_with_prior(extracted: &ExtractionResult, prior: Option<&VitalReading>) -> VitalValues {
    let previous = prior.map(|r| r.values).unwrap_or_default();

    VitalValues {
        systolic_bp: prefer_fresh(extracted.systolic_bp, previous.systolic_bp),
        diastolic_bp: prefer_fresh(extracted.diastolic_bp, previous.diastolic_bp),
        blood_sugar: prefer_fresh(extracted.blood_sugar, previous.blood_sugar),
        fluid_input: previous.fluid_input,
        fluid_output: previous.fluid_output,
    }
}

fn prefer_fresh(fresh: u32, previous: u32) -> u32 {
    if fresh != 0 {
        fresh
    } else {
        previous
    }
}
