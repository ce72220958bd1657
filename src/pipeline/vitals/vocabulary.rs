//! Translation tables between the model-facing key vocabularies and the
//! canonical [`ExtractionResult`] schema.

use crate::models::ExtractionResult;

/// Fields of the canonical readout schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    SystolicBp,
    DiastolicBp,
    BloodSugar,
    HeartRate,
    OxygenSaturation,
    FluidInput,
    FluidOutput,
}

impl CanonicalField {
    /// Write `value` into the matching slot of `result`.
    pub fn apply(self, result: &mut ExtractionResult, value: u32) {
        match self {
            Self::SystolicBp => result.systolic_bp = value,
            Self::DiastolicBp => result.diastolic_bp = value,
            Self::BloodSugar => result.blood_sugar = value,
            Self::HeartRate => result.supplementary.heart_rate = Some(value),
            Self::OxygenSaturation => result.supplementary.oxygen_saturation = Some(value),
            Self::FluidInput => result.supplementary.fluid_input = Some(value),
            Self::FluidOutput => result.supplementary.fluid_output = Some(value),
        }
    }
}

pub const MONITOR_INSTRUCTION: &str = "Please analyze this medical vital signs image and extract \
the following values in JSON format: blood_pressure_systolic, blood_pressure_diastolic, \
heart_rate, blood_sugar, oxygen_saturation. Return ONLY a JSON object with these keys and \
numeric values. If a value is not found, use 0.";

pub const LEGACY_INSTRUCTION: &str = "Extract the following vital signs from this image: \
Systolic BP, Diastolic BP, Blood Sugar, Fluid Input, and Fluid Output. Return only the \
numbers in a structured format. If any value is not found, return 0 for that value.";

const MONITOR_KEYS: &[(&str, CanonicalField)] = &[
    ("blood_pressure_systolic", CanonicalField::SystolicBp),
    ("blood_pressure_diastolic", CanonicalField::DiastolicBp),
    ("heart_rate", CanonicalField::HeartRate),
    ("blood_sugar", CanonicalField::BloodSugar),
    ("oxygen_saturation", CanonicalField::OxygenSaturation),
];

const LEGACY_KEYS: &[(&str, CanonicalField)] = &[
    ("systolic_bp", CanonicalField::SystolicBp),
    ("diastolic_bp", CanonicalField::DiastolicBp),
    ("blood_sugar", CanonicalField::BloodSugar),
    ("fluid_input", CanonicalField::FluidInput),
    ("fluid_output", CanonicalField::FluidOutput),
];

/// A model-facing naming of the vital fields.
///
/// `Monitor` is keyed JSON as produced for bedside monitor photos.
/// `Legacy` is the older positional readout; its keys only name the
/// positions, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    Monitor,
    Legacy,
}

impl Vocabulary {
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Monitor => MONITOR_INSTRUCTION,
            Self::Legacy => LEGACY_INSTRUCTION,
        }
    }

    /// External key → canonical field, in the order the instruction lists them.
    pub fn keys(&self) -> &'static [(&'static str, CanonicalField)] {
        match self {
            Self::Monitor => MONITOR_KEYS,
            Self::Legacy => LEGACY_KEYS,
        }
    }

    /// Build a canonical result from values in [`keys`](Self::keys) order.
    ///
    /// Missing trailing values resolve to 0. Every field this vocabulary
    /// names ends up set, so its supplementary readouts are always reported.
    pub fn assemble<I>(&self, values: I) -> ExtractionResult
    where
        I: IntoIterator<Item = u32>,
    {
        let mut result = ExtractionResult::default();
        let mut values = values.into_iter();
        for (_, field) in self.keys() {
            field.apply(&mut result, values.next().unwrap_or(0));
        }
        result
    }
}
