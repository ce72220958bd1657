//! Medication endpoints.
//!
//! - `GET /api/patients/:id/medications`: alphabetical
//! - `POST /api/patients/:id/medications`: add one
//! - `POST /api/medications/:id/administered`: mark given / not given
//! - `DELETE /api/medications/:id`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::patients::require_patient;
use super::{parse_id, required_name, run_blocking};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::Medication;

#[derive(Deserialize)]
pub struct CreateMedicationRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct AdministeredRequest {
    pub given: bool,
}

/// `GET /api/patients/:id/medications`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Medication>>, ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    let core = ctx.core.clone();
    let meds = run_blocking(move || {
        let conn = core.open_db()?;
        require_patient(&conn, &id)?;
        Ok(db::get_medications_for_patient(&conn, &id)?)
    })
    .await?;
    Ok(Json(meds))
}

/// `POST /api/patients/:id/medications`
pub async fn create(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    Json(body): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<Medication>), ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    let name = required_name(&body.name, "Medication")?;
    let core = ctx.core.clone();
    let med = run_blocking(move || {
        let conn = core.open_db()?;
        require_patient(&conn, &id)?;
        let med = Medication::new(id, &name);
        db::insert_medication(&conn, &med)?;
        Ok(med)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(med)))
}

/// `POST /api/medications/:id/administered`
pub async fn set_administered(
    State(ctx): State<ApiContext>,
    Path(medication_id): Path<String>,
    Json(body): Json<AdministeredRequest>,
) -> Result<Json<Medication>, ApiError> {
    let id = parse_id(&medication_id, "medication")?;
    let core = ctx.core.clone();
    let med = run_blocking(move || {
        let conn = core.open_db()?;
        db::set_medication_administered(&conn, &id, body.given)?;
        db::get_medication(&conn, &id)?
            .ok_or_else(|| ApiError::NotFound("medication not found".into()))
    })
    .await?;
    tracing::info!(medication_id = %med.id, given = med.is_administered, "Medication administration updated");
    Ok(Json(med))
}

/// `DELETE /api/medications/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(medication_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&medication_id, "medication")?;
    let core = ctx.core.clone();
    run_blocking(move || Ok(db::delete_medication(&core.open_db()?, &id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}
