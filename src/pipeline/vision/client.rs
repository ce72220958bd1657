use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::request::{ImageDetail, VisionRequest};
use super::VisionError;

/// Vision-language model abstraction (allows mocking).
///
/// Implementations send one instruction plus one image and return the
/// model's raw text completion.
pub trait VisionClient: Send + Sync {
    fn complete(&self, request: &VisionRequest) -> Result<String, VisionError>;
}

// ──────────────────────────────────────────────
// OpenAiVisionClient
// ──────────────────────────────────────────────

/// Hosted vision model client speaking the OpenAI Responses API.
pub struct OpenAiVisionClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiVisionClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, VisionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| VisionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout_secs,
        })
    }
}

/// Request body for `POST /v1/responses`
#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: [InputMessage<'a>; 1],
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: [InputContent<'a>; 2],
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputContent<'a> {
    InputText { text: &'a str },
    InputImage { image_url: &'a str, detail: ImageDetail },
}

impl<'a> ResponsesRequest<'a> {
    fn from_request(request: &'a VisionRequest) -> Self {
        Self {
            model: &request.model,
            input: [InputMessage {
                role: "user",
                content: [
                    InputContent::InputText {
                        text: &request.instruction,
                    },
                    InputContent::InputImage {
                        image_url: &request.image_url,
                        detail: request.detail,
                    },
                ],
            }],
            max_output_tokens: request.max_output_tokens,
        }
    }
}

/// Response body from `POST /v1/responses`
#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    /// Concatenated output text, preferring the aggregated field when present.
    fn into_text(self) -> String {
        if let Some(text) = self.output_text.filter(|t| !t.trim().is_empty()) {
            return text;
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|c| c.kind == "output_text")
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("")
    }
}

impl VisionClient for OpenAiVisionClient {
    fn complete(&self, request: &VisionRequest) -> Result<String, VisionError> {
        let api_key = self.api_key.as_deref().ok_or(VisionError::NotConfigured)?;
        let url = format!("{}/v1/responses", self.base_url);
        let body = ResponsesRequest::from_request(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    VisionError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    VisionError::Timeout(self.timeout_secs)
                } else {
                    VisionError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ResponsesResponse = response
            .json()
            .map_err(|e| VisionError::ResponseParsing(e.to_string()))?;

        let text = parsed.into_text();
        if text.trim().is_empty() {
            return Err(VisionError::EmptyOutput);
        }
        Ok(text)
    }
}

// ──────────────────────────────────────────────
// MockVisionClient (testing)
// ──────────────────────────────────────────────

/// Mock vision client for testing. Returns a configurable response and
/// records every request it receives.
pub struct MockVisionClient {
    response: Result<String, String>,
    requests: Mutex<Vec<VisionRequest>>,
}

impl MockVisionClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with an HTTP error.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<VisionRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl VisionClient for MockVisionClient {
    fn complete(&self, request: &VisionRequest) -> Result<String, VisionError> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request.clone());
        }
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(VisionError::HttpClient(message.clone())),
        }
    }
}
