//! Vital sign endpoints.
//!
//! - `GET /api/patients/:id/vitals`: history, newest first
//! - `POST /api/patients/:id/vitals/upload`: photo → merged reading

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::ocr::{image_from_body, OcrRequest};
use super::patients::require_patient;
use super::{parse_id, run_blocking};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{ExtractionResult, VitalReading};
use crate::pipeline::vitals::ImageInput;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub reading: VitalReading,
    /// Values read from the photo before merging, including supplementary readouts.
    pub extracted: ExtractionResult,
}

/// `GET /api/patients/:id/vitals`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<VitalReading>>, ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    let core = ctx.core.clone();
    let readings = run_blocking(move || {
        let conn = core.open_db()?;
        require_patient(&conn, &id)?;
        Ok(db::list_vital_readings(&conn, &id)?)
    })
    .await?;
    Ok(Json(readings))
}

/// `POST /api/patients/:id/vitals/upload`
///
/// Extracts vitals from the photo, merges them with the latest stored
/// reading and stores the result as a new reading.
pub async fn upload(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    payload: Result<Json<OcrRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    let image = image_from_body(payload)?;
    let core = ctx.core.clone();

    let outcome = run_blocking(move || {
        require_patient(&core.open_db()?, &id)?;
        Ok(core.uploader().upload(&id, ImageInput::Base64(image))?)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            reading: outcome.reading,
            extracted: outcome.extracted,
        }),
    ))
}
