//! API endpoint handlers.
//!
//! Database and vision work is blocking; handlers move it onto the
//! blocking pool with [`run_blocking`].

pub mod health;
pub mod medications;
pub mod ocr;
pub mod patients;
pub mod vitals;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Run blocking work off the async runtime.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Parse a path identifier, reporting which entity it names.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {entity} ID: {e}")))
}

/// Trimmed, non-empty name or a 400.
pub(crate) fn required_name(raw: &str, entity: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest(format!("{entity} name is required")));
    }
    Ok(name.to_string())
}
