//! Vision model integration: builds the multimodal request for a monitor
//! photo and sends it to a hosted vision-language model.

pub mod client;
pub mod request;

pub use client::*;
pub use request::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Vision model API key is not configured")]
    NotConfigured,

    #[error("Vision model is not reachable at {0}")]
    Connection(String),

    #[error("Vision request timed out after {0}s")]
    Timeout(u64),

    #[error("Vision model returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Vision model returned no text")]
    EmptyOutput,
}
