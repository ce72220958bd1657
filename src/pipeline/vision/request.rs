use base64::Engine as _;
use serde::Serialize;

/// Resolution hint passed with the embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDetail {
    Low,
    High,
    Auto,
}

/// Output budget for a vitals readout. Five numbers in JSON fit easily.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 300;

/// One prompt plus one embedded image, ready to send to a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionRequest {
    pub model: String,
    pub instruction: String,
    /// `data:<mime>;base64,<payload>`
    pub image_url: String,
    pub detail: ImageDetail,
    pub max_output_tokens: u32,
}

impl VisionRequest {
    /// Build a high-detail request for the given image bytes.
    ///
    /// The bytes are not inspected beyond MIME sniffing: empty or
    /// non-medical images are passed through unchanged.
    pub fn new(model: &str, instruction: &str, image_bytes: &[u8]) -> Self {
        Self {
            model: model.to_string(),
            instruction: instruction.to_string(),
            image_url: encode_data_uri(image_bytes),
            detail: ImageDetail::High,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Size of the encoded image in bytes, for logging.
    pub fn image_url_len(&self) -> usize {
        self.image_url.len()
    }
}

/// Encode image bytes as a base64 data URI.
pub fn encode_data_uri(image_bytes: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(image_bytes);
    format!("data:{};base64,{payload}", detect_image_mime(image_bytes))
}

/// Sniff the image MIME type from magic bytes. Unknown content is labelled JPEG,
/// which is what phone cameras produce.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
