use std::sync::Arc;

use super::parser::parse_response;
use super::{ExtractionError, ExtractionMode};
use crate::models::ExtractionResult;
use crate::pipeline::vision::{VisionClient, VisionRequest};

// ──────────────────────────────────────────────
// VitalsExtractor
// ──────────────────────────────────────────────

/// Turns a monitor photo into an [`ExtractionResult`].
///
/// Holds no state between calls. Accepts any `VisionClient` (hosted or mock).
pub struct VitalsExtractor {
    client: Arc<dyn VisionClient>,
    model: String,
    mode: ExtractionMode,
}

impl VitalsExtractor {
    pub fn new(client: Arc<dyn VisionClient>, model: &str, mode: ExtractionMode) -> Self {
        Self {
            client,
            model: model.to_string(),
            mode,
        }
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Encode the image and wrap it with this mode's instruction.
    pub fn build_request(&self, image_bytes: &[u8]) -> VisionRequest {
        VisionRequest::new(&self.model, self.mode.vocabulary().instruction(), image_bytes)
    }

    /// Send the request. Any failure to get usable text is an upstream failure.
    pub fn request(&self, request: &VisionRequest) -> Result<String, ExtractionError> {
        let raw = self.client.complete(request)?;
        if raw.trim().is_empty() {
            return Err(ExtractionError::UpstreamCallFailure(
                "vision model returned no text".into(),
            ));
        }
        Ok(raw)
    }

    pub fn parse(&self, raw: &str) -> Result<ExtractionResult, ExtractionError> {
        parse_response(raw, self.mode)
    }

    /// Encode, request and parse in one call.
    pub fn extract(&self, image_bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        let _span = tracing::info_span!(
            "vitals_extract",
            model = %self.model,
            mode = self.mode.as_str(),
            image_size = image_bytes.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let request = self.build_request(image_bytes);
        let raw = self.request(&request)?;
        let result = self.parse(&raw)?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            response_len = raw.len(),
            empty = result.is_empty(),
            "Vitals extraction complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::vision::MockVisionClient;
    use crate::pipeline::vitals::vocabulary::{LEGACY_INSTRUCTION, MONITOR_INSTRUCTION};

    fn extractor(response: &str, mode: ExtractionMode) -> (Arc<MockVisionClient>, VitalsExtractor) {
        let mock = Arc::new(MockVisionClient::new(response));
        let extractor = VitalsExtractor::new(mock.clone(), "gpt-4o-mini", mode);
        (mock, extractor)
    }

    #[test]
    fn strict_extraction_uses_monitor_instruction() {
        let (mock, extractor) = extractor(
            r#"{"blood_pressure_systolic": 122, "blood_pressure_diastolic": 79}"#,
            ExtractionMode::Strict,
        );
        let result = extractor.extract(b"\xFF\xD8\xFF").unwrap();
        assert_eq!(result.systolic_bp, 122);
        assert_eq!(result.diastolic_bp, 79);

        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].instruction, MONITOR_INSTRUCTION);
        assert_eq!(sent[0].model, "gpt-4o-mini");
    }

    #[test]
    fn positional_extraction_uses_legacy_instruction() {
        let (mock, extractor) = extractor("120 80 95 500 300", ExtractionMode::Positional);
        let result = extractor.extract(b"img").unwrap();
        assert_eq!(result.supplementary.fluid_output, Some(300));
        assert_eq!(mock.requests()[0].instruction, LEGACY_INSTRUCTION);
    }

    #[test]
    fn empty_image_is_still_sent() {
        let (mock, extractor) = extractor("{}", ExtractionMode::Strict);
        let result = extractor.extract(&[]).unwrap();
        assert!(result.is_empty());
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn blank_completion_is_upstream_failure() {
        let (_, extractor) = extractor("   \n", ExtractionMode::Strict);
        assert!(matches!(
            extractor.extract(b"img"),
            Err(ExtractionError::UpstreamCallFailure(_))
        ));
    }

    #[test]
    fn client_error_is_upstream_failure() {
        let mock = Arc::new(MockVisionClient::failing("503 Service Unavailable"));
        let extractor = VitalsExtractor::new(mock, "gpt-4o-mini", ExtractionMode::Strict);
        let err = extractor.extract(b"img").unwrap_err();
        assert!(matches!(err, ExtractionError::UpstreamCallFailure(_)));
    }

    #[test]
    fn prose_is_malformed_in_strict_mode() {
        let (_, extractor) = extractor("I could not read the image clearly.", ExtractionMode::Strict);
        assert!(matches!(
            extractor.extract(b"img"),
            Err(ExtractionError::MalformedResponse { .. })
        ));
    }
}
