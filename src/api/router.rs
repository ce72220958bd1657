//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router with all endpoints under `/api/`.
///
/// Responses carry `Cache-Control: no-store`; they contain patient data.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/schema", get(endpoints::health::schema))
        .route("/ocr/vitals", post(endpoints::ocr::extract_vitals))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route("/patients/:id/dashboard", get(endpoints::patients::dashboard))
        .route("/patients/:id/vitals", get(endpoints::vitals::list))
        .route("/patients/:id/vitals/upload", post(endpoints::vitals::upload))
        .route(
            "/patients/:id/medications",
            get(endpoints::medications::list).post(endpoints::medications::create),
        )
        .route(
            "/medications/:id/administered",
            post(endpoints::medications::set_administered),
        )
        .route(
            "/medications/:id",
            axum::routing::delete(endpoints::medications::remove),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use base64::Engine;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::pipeline::vision::MockVisionClient;

    const MONITOR_JSON: &str = "```json\n{\"blood_pressure_systolic\": 120, \
        \"blood_pressure_diastolic\": 0, \"heart_rate\": 72, \"blood_sugar\": 95, \
        \"oxygen_saturation\": 98}\n```";

    /// CoreState backed by a temp database and a mock vision model.
    /// The tempdir guard must be kept alive for the duration of the test.
    fn test_core(vision: Arc<MockVisionClient>) -> (Arc<CoreState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.database_path = tmp.path().join("chart.db");
        (Arc::new(CoreState::new(config, vision)), tmp)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn image_b64() -> String {
        base64::engine::general_purpose::STANDARD.encode(b"\xFF\xD8\xFF\xE0monitor")
    }

    async fn create_patient(app: &Router, name: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/patients", serde_json::json!({ "name": name })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_returns_ok_with_no_store() {
        let (core, _tmp) = test_core(Arc::new(MockVisionClient::new("{}")));
        let app = api_router(core);

        let response = app.oneshot(empty_request("GET", "/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn schema_reports_all_tables() {
        let (core, _tmp) = test_core(Arc::new(MockVisionClient::new("{}")));
        let response = api_router(core)
            .oneshot(empty_request("GET", "/api/schema"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["patients"], true);
        assert_eq!(json["vital_signs"], true);
        assert_eq!(json["medications"], true);
    }

    #[tokio::test]
    async fn ocr_returns_extracted_fields() {
        let mock = Arc::new(MockVisionClient::new(MONITOR_JSON));
        let (core, _tmp) = test_core(mock.clone());
        let response = api_router(core)
            .oneshot(json_request(
                "POST",
                "/api/ocr/vitals",
                serde_json::json!({ "image": image_b64() }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["systolic_bp"], 120);
        assert_eq!(json["diastolic_bp"], 0);
        assert_eq!(json["blood_sugar"], 95);
        assert_eq!(json["heart_rate"], 72);
        assert_eq!(json["oxygen_saturation"], 98);
        assert!(json.get("fluid_input").is_none());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn ocr_without_image_is_400_and_skips_model() {
        let mock = Arc::new(MockVisionClient::new(MONITOR_JSON));
        let (core, _tmp) = test_core(mock.clone());
        let app = api_router(core);

        for body in [serde_json::json!({}), serde_json::json!({ "image": "" })] {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/api/ocr/vitals", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = body_json(response).await;
            assert_eq!(json["error"], "No image data provided");
            assert_eq!(json["code"], "MISSING_INPUT");
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn ocr_with_non_json_body_is_400() {
        let (core, _tmp) = test_core(Arc::new(MockVisionClient::new("{}")));
        let request = Request::builder()
            .method("POST")
            .uri("/api/ocr/vitals")
            .header("Content-Type", "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let response = api_router(core).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ocr_malformed_model_output_is_500() {
        let mock = Arc::new(MockVisionClient::new("I could not read the image clearly."));
        let (core, _tmp) = test_core(mock);
        let response = api_router(core)
            .oneshot(json_request(
                "POST",
                "/api/ocr/vitals",
                serde_json::json!({ "image": image_b64() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], "MALFORMED_RESPONSE");
        assert!(json["error"].as_str().unwrap().contains("try again"));
    }

    #[tokio::test]
    async fn ocr_upstream_failure_is_500() {
        let mock = Arc::new(MockVisionClient::failing("connection refused"));
        let (core, _tmp) = test_core(mock);
        let response = api_router(core)
            .oneshot(json_request(
                "POST",
                "/api/ocr/vitals",
                serde_json::json!({ "image": image_b64() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "UPSTREAM_CALL_FAILURE");
    }

    #[tokio::test]
    async fn patient_crud_round_trip() {
        let (core, _tmp) = test_core(Arc::new(MockVisionClient::new("{}")));
        let app = api_router(core);

        let first = create_patient(&app, "  Ada Lovelace ").await;
        let second = create_patient(&app, "Grace Hopper").await;

        let response = app.clone().oneshot(empty_request("GET", "/api/patients")).await.unwrap();
        let list = body_json(response).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
        assert_eq!(list[0]["id"], second.as_str());
        assert_eq!(list[1]["name"], "Ada Lovelace");

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/patients/{first}"),
                serde_json::json!({ "name": "Ada King", "medications": ["Warfarin", " ", "Warfarin", "Aspirin"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let detail = body_json(response).await;
        assert_eq!(detail["patient"]["name"], "Ada King");
        let meds: Vec<&str> = detail["medications"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(meds, vec!["Aspirin", "Warfarin"]);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/patients/{first}"),
                serde_json::json!({ "name": "   " }),
            ))
            .await
            .unwrap();
        let detail = body_json(response).await;
        assert_eq!(detail["patient"]["name"], "Ada King");
        assert_eq!(detail["medications"].as_array().unwrap().len(), 2);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/api/patients/{first}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(empty_request("GET", &format!("/api/patients/{first}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_patient_name_is_rejected() {
        let (core, _tmp) = test_core(Arc::new(MockVisionClient::new("{}")));
        let response = api_router(core)
            .oneshot(json_request("POST", "/api/patients", serde_json::json!({ "name": "  " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_patient_id_is_400() {
        let (core, _tmp) = test_core(Arc::new(MockVisionClient::new("{}")));
        let response = api_router(core)
            .oneshot(empty_request("GET", "/api/patients/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_merges_and_appears_on_dashboard() {
        let mock = Arc::new(MockVisionClient::new(MONITOR_JSON));
        let (core, _tmp) = test_core(mock);
        let app = api_router(core.clone());
        let patient_id = create_patient(&app, "Upload Patient").await;

        // Seed a prior reading with fluid balance.
        {
            let conn = core.open_db().unwrap();
            let id = uuid::Uuid::parse_str(&patient_id).unwrap();
            let mut prior = crate::models::VitalReading::new(
                id,
                crate::models::VitalValues {
                    systolic_bp: 118,
                    diastolic_bp: 76,
                    blood_sugar: 0,
                    fluid_input: 500,
                    fluid_output: 300,
                },
            );
            prior.taken_at -= chrono::Duration::seconds(5);
            crate::db::insert_vital_reading(&conn, &prior).unwrap();
        }

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/patients/{patient_id}/vitals/upload"),
                serde_json::json!({ "image": image_b64() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["reading"]["systolic_bp"], 120);
        assert_eq!(json["reading"]["diastolic_bp"], 76);
        assert_eq!(json["reading"]["blood_sugar"], 95);
        assert_eq!(json["reading"]["fluid_input"], 500);
        assert_eq!(json["reading"]["fluid_output"], 300);
        assert_eq!(json["extracted"]["heart_rate"], 72);

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/patients/{patient_id}/vitals")))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

        let response = app
            .oneshot(empty_request("GET", &format!("/api/patients/{patient_id}/dashboard")))
            .await
            .unwrap();
        let dashboard = body_json(response).await;
        assert_eq!(dashboard["patient"]["name"], "Upload Patient");
        assert_eq!(dashboard["latest_vitals"]["systolic_bp"], 120);
    }

    #[tokio::test]
    async fn upload_for_unknown_patient_is_404() {
        let mock = Arc::new(MockVisionClient::new(MONITOR_JSON));
        let (core, _tmp) = test_core(mock.clone());
        let uri = format!("/api/patients/{}/vitals/upload", uuid::Uuid::new_v4());
        let response = api_router(core)
            .oneshot(json_request("POST", &uri, serde_json::json!({ "image": image_b64() })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_upload_stores_nothing() {
        let mock = Arc::new(MockVisionClient::new("no numbers here"));
        let (core, _tmp) = test_core(mock);
        let app = api_router(core);
        let patient_id = create_patient(&app, "Failed Upload").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/patients/{patient_id}/vitals/upload"),
                serde_json::json!({ "image": image_b64() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = app
            .oneshot(empty_request("GET", &format!("/api/patients/{patient_id}/vitals")))
            .await
            .unwrap();
        assert!(body_json(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn medication_lifecycle() {
        let (core, _tmp) = test_core(Arc::new(MockVisionClient::new("{}")));
        let app = api_router(core);
        let patient_id = create_patient(&app, "Med Patient").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/patients/{patient_id}/medications"),
                serde_json::json!({ "name": " Metformin " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let med = body_json(response).await;
        assert_eq!(med["name"], "Metformin");
        assert_eq!(med["is_administered"], false);
        let med_id = med["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/medications/{med_id}/administered"),
                serde_json::json!({ "given": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["is_administered"], true);

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/patients/{patient_id}/dashboard")))
            .await
            .unwrap();
        let dashboard = body_json(response).await;
        assert!(dashboard["latest_vitals"].is_null());
        assert_eq!(dashboard["medications"][0]["name"], "Metformin");

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/api/medications/{med_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(empty_request("DELETE", &format!("/api/medications/{med_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
