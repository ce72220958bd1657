use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::vocabulary::Vocabulary;
use super::{ExtractionError, ExtractionMode};
use crate::models::ExtractionResult;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").expect("valid regex"));

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Remove Markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Coerce one JSON value to a non-negative integer reading.
///
/// Numbers and numeric strings are rounded to the nearest integer. Anything
/// negative, non-finite, beyond `u32`, or not numeric at all becomes 0.
pub fn coerce_value(value: &Value) -> u32 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.map(clamp_reading).unwrap_or(0)
}

fn clamp_reading(n: f64) -> u32 {
    if !n.is_finite() || n < 0.0 {
        return 0;
    }
    let rounded = n.round();
    if rounded > u32::MAX as f64 {
        0
    } else {
        rounded as u32
    }
}

/// Parse a keyed JSON readout in the monitor vocabulary.
///
/// The document must be a JSON object once code fences are removed. Missing
/// or unusable keys resolve to 0; extra keys are ignored.
pub fn parse_strict(raw: &str) -> Result<ExtractionResult, ExtractionError> {
    let cleaned = strip_code_fences(raw);
    let document: Value = serde_json::from_str(&cleaned).map_err(|e| {
        tracing::warn!(response_len = raw.len(), error = %e, "Vision output is not valid JSON");
        ExtractionError::MalformedResponse {
            raw: raw.to_string(),
        }
    })?;

    let Value::Object(fields) = document else {
        tracing::warn!(response_len = raw.len(), "Vision output is not a JSON object");
        return Err(ExtractionError::MalformedResponse {
            raw: raw.to_string(),
        });
    };

    let vocabulary = Vocabulary::Monitor;
    let values = vocabulary
        .keys()
        .iter()
        .map(|(key, _)| fields.get(*key).map(coerce_value).unwrap_or(0));
    Ok(vocabulary.assemble(values))
}

/// Assign digit runs, left to right, to the legacy fields in order.
///
/// Never fails: text without digits yields all zeros. A readout that skips
/// or reorders a value shifts every later field.
pub fn parse_positional(raw: &str) -> ExtractionResult {
    let values = DIGIT_RUN
        .find_iter(raw)
        .map(|m| m.as_str().parse::<u32>().unwrap_or(0));
    Vocabulary::Legacy.assemble(values)
}

/// Parse model output with the given mode. A strict failure is returned as
/// is; positional parsing is only used when explicitly selected.
pub fn parse_response(
    raw: &str,
    mode: ExtractionMode,
) -> Result<ExtractionResult, ExtractionError> {
    match mode {
        ExtractionMode::Strict => parse_strict(raw),
        ExtractionMode::Positional => Ok(parse_positional(raw)),
    }
}
