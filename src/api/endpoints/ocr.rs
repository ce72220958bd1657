//! Stateless vitals OCR endpoint.
//!
//! `POST /api/ocr/vitals`: reads a monitor photo and returns the extracted
//! fields without touching the database.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::run_blocking;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::ExtractionResult;
use crate::pipeline::vitals::{ExtractionError, ImageInput};

#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    /// Base64 image payload, without a data-URI prefix.
    #[serde(default)]
    pub image: Option<String>,
}

/// Base64 payload from a request body, or `MissingInput`.
pub(crate) fn image_from_body(
    payload: Result<Json<OcrRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ExtractionError::MissingInput(format!("unreadable request body: {rejection}"))
    })?;
    request
        .image
        .filter(|image| !image.trim().is_empty())
        .ok_or_else(|| ExtractionError::MissingInput("image field is missing".into()).into())
}

/// `POST /api/ocr/vitals`
pub async fn extract_vitals(
    State(ctx): State<ApiContext>,
    payload: Result<Json<OcrRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let image = image_from_body(payload)?;
    let core = ctx.core.clone();

    let result = run_blocking(move || {
        let bytes = ImageInput::Base64(image).into_bytes()?;
        Ok(core.extractor().extract(&bytes)?)
    })
    .await?;

    Ok(Json(result))
}
