//! Health and schema check endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::run_blocking;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /api/health`: liveness check.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
    })
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SchemaResponse {
    pub patients: bool,
    pub vital_signs: bool,
    pub medications: bool,
}

/// `GET /api/schema`: whether each charting table exists.
pub async fn schema(State(ctx): State<ApiContext>) -> Result<Json<SchemaResponse>, ApiError> {
    let core = ctx.core.clone();
    let response = run_blocking(move || {
        let conn = core.open_db()?;
        Ok(SchemaResponse {
            patients: db::table_exists(&conn, "patients")?,
            vital_signs: db::table_exists(&conn, "vital_signs")?,
            medications: db::table_exists(&conn, "medications")?,
        })
    })
    .await?;
    Ok(Json(response))
}
