//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::pipeline::vitals::ExtractionError;

/// Message returned when an image could not be turned into vitals.
const RETRY_MESSAGE: &str = "Failed to process image. Please try again.";

/// Error response body: `{ "error": "...", "code": "..." }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Extraction(err @ ExtractionError::MissingInput(_)) => (
                StatusCode::BAD_REQUEST,
                err.kind(),
                "No image data provided".to_string(),
            ),
            ApiError::Extraction(err) => {
                tracing::error!(kind = err.kind(), error = %err, "Vitals extraction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.kind(),
                    RETRY_MESSAGE.to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, .. } => {
                ApiError::NotFound(format!("{entity_type} not found"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn missing_input_returns_400() {
        let err = ApiError::from(ExtractionError::MissingInput("image is empty".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No image data provided");
        assert_eq!(json["code"], "MISSING_INPUT");
    }

    #[tokio::test]
    async fn malformed_response_returns_500_without_raw_text() {
        let err = ApiError::from(ExtractionError::MalformedResponse {
            raw: "Jane Doe, bed 4".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], RETRY_MESSAGE);
        assert_eq!(json["code"], "MALFORMED_RESPONSE");
        assert!(!json.to_string().contains("Jane"));
    }

    #[tokio::test]
    async fn upstream_failure_returns_500() {
        let err = ApiError::from(ExtractionError::UpstreamCallFailure("timeout".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "UPSTREAM_CALL_FAILURE");
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let err: ApiError = DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: "abc".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "patient not found");
    }

    #[tokio::test]
    async fn bad_request_returns_400() {
        let response = ApiError::BadRequest("Invalid ID format".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn internal_hides_detail() {
        let response = ApiError::Internal("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "An internal error occurred");
        assert_eq!(json["code"], "INTERNAL");
    }
}
