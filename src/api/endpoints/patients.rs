//! Patient endpoints.
//!
//! - `POST /api/patients`: register
//! - `GET /api/patients`: list, newest first
//! - `GET /api/patients/:id`: patient with medications
//! - `PUT /api/patients/:id`: rename and/or replace medication list
//! - `DELETE /api/patients/:id`: remove with readings and medications
//! - `GET /api/patients/:id/dashboard`: today's chart

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parse_id, required_name, run_blocking};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{Medication, Patient, VitalReading};

#[derive(Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub medications: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct PatientDetail {
    pub patient: Patient,
    pub medications: Vec<Medication>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub patient: Patient,
    /// Latest reading taken today, if any.
    pub latest_vitals: Option<VitalReading>,
    pub medications: Vec<Medication>,
}

/// Load a patient or fail with 404.
pub(crate) fn require_patient(
    conn: &rusqlite::Connection,
    id: &Uuid,
) -> Result<Patient, ApiError> {
    db::get_patient(conn, id)?.ok_or_else(|| ApiError::NotFound("patient not found".into()))
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(body): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let name = required_name(&body.name, "Patient")?;
    let core = ctx.core.clone();
    let patient = run_blocking(move || {
        let conn = core.open_db()?;
        let patient = Patient::new(&name);
        db::insert_patient(&conn, &patient)?;
        tracing::info!(patient_id = %patient.id, "Patient registered");
        Ok(patient)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    let core = ctx.core.clone();
    let patients = run_blocking(move || Ok(db::list_patients(&core.open_db()?)?)).await?;
    Ok(Json(patients))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientDetail>, ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    let core = ctx.core.clone();
    let detail = run_blocking(move || {
        let conn = core.open_db()?;
        let patient = require_patient(&conn, &id)?;
        let medications = db::get_medications_for_patient(&conn, &id)?;
        Ok(PatientDetail {
            patient,
            medications,
        })
    })
    .await?;
    Ok(Json(detail))
}

/// `PUT /api/patients/:id`
///
/// A blank name leaves the name unchanged. A medication list, when given,
/// replaces the current one.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    Json(body): Json<UpdatePatientRequest>,
) -> Result<Json<PatientDetail>, ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    let core = ctx.core.clone();
    let detail = run_blocking(move || {
        let mut conn = core.open_db()?;
        require_patient(&conn, &id)?;

        if let Some(name) = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            db::rename_patient(&conn, &id, name)?;
        }
        let medications = match &body.medications {
            Some(names) => db::replace_medications(&mut conn, &id, names)?,
            None => db::get_medications_for_patient(&conn, &id)?,
        };

        Ok(PatientDetail {
            patient: require_patient(&conn, &id)?,
            medications,
        })
    })
    .await?;
    Ok(Json(detail))
}

/// `DELETE /api/patients/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    let core = ctx.core.clone();
    run_blocking(move || {
        db::delete_patient(&core.open_db()?, &id)?;
        tracing::info!(patient_id = %id, "Patient deleted");
        Ok(())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/patients/:id/dashboard`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    let core = ctx.core.clone();
    let response = run_blocking(move || {
        let conn = core.open_db()?;
        let patient = require_patient(&conn, &id)?;
        let today = db::start_of_today();
        Ok(DashboardResponse {
            patient,
            latest_vitals: db::get_latest_vital_reading_since(&conn, &id, &today)?,
            medications: db::get_medications_since(&conn, &id, &today)?,
        })
    })
    .await?;
    Ok(Json(response))
}
