//! Integration tests for quakesafe-web API endpoints
//!
//! Tests cover:
//! - Health, build info and landing page
//! - Chat routing: prediction redirect vs. forwarding to the language model
//! - Building assessment: success path, upload checks, form validation
//! - Upstream failures and request size limits
//!
//! External models are replaced by in-process stubs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use quakesafe_common::prompts::{self, PREDICT_REDIRECT_REPLY};
use quakesafe_common::{BuildingFeatureVector, CrackVerdict, StructuralPrediction};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

use quakesafe_web::services::{CrackPipeline, Explainer, UploadStore};
use quakesafe_web::types::{CrackDetector, InferenceError, LanguageModel, StructuralClassifier};
use quakesafe_web::{build_router, AppState};

// =============================================================================
// Stubs
// =============================================================================

/// Returns a fixed prediction and records the feature vectors it saw
struct StubStructural {
    label: u8,
    probabilities: [f64; 2],
    seen: Mutex<Vec<BuildingFeatureVector>>,
}

impl StubStructural {
    fn new(label: u8, probabilities: [f64; 2]) -> Self {
        Self {
            label,
            probabilities,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl StructuralClassifier for StubStructural {
    fn name(&self) -> &str {
        "stub-structural"
    }

    async fn predict(
        &self,
        features: &BuildingFeatureVector,
    ) -> Result<StructuralPrediction, InferenceError> {
        self.seen.lock().unwrap().push(*features);
        StructuralPrediction::new(self.label, self.probabilities)
            .map_err(|e| InferenceError::InvalidOutput(e.to_string()))
    }
}

struct StubDetector(f64);

#[async_trait::async_trait]
impl CrackDetector for StubDetector {
    fn name(&self) -> &str {
        "stub-detector"
    }

    async fn score(&self, image: &[u8]) -> Result<f64, InferenceError> {
        assert!(!image.is_empty(), "detector received an empty image");
        Ok(self.0)
    }
}

/// Echoes prompts back and counts calls
#[derive(Default)]
struct RecordingModel {
    prompts: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl LanguageModel for RecordingModel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("explained: {}", prompt))
    }
}

#[derive(Default)]
struct FailingModel {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl LanguageModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(InferenceError::Api(503, "model overloaded".to_string()))
    }
}

// =============================================================================
// Helpers
// =============================================================================

struct TestApp {
    router: Router,
    structural: Arc<StubStructural>,
    llm: Arc<RecordingModel>,
    upload_dir: TempDir,
}

fn setup_app_with(
    structural: StubStructural,
    scores: (f64, f64, f64),
    max_upload_bytes: Option<usize>,
) -> TestApp {
    let upload_dir = TempDir::new().expect("Should create upload dir");
    let structural = Arc::new(structural);
    let llm = Arc::new(RecordingModel::default());

    let crack = CrackPipeline::new(
        Arc::new(StubDetector(scores.0)),
        Arc::new(StubDetector(scores.1)),
        Arc::new(StubDetector(scores.2)),
    );
    let uploads = UploadStore::new(upload_dir.path()).expect("Should create upload store");

    let mut state = AppState::new(structural.clone(), crack, Explainer::new(llm.clone()), uploads);
    if let Some(limit) = max_upload_bytes {
        state = state.with_max_upload_bytes(limit);
    }

    TestApp {
        router: build_router(state),
        structural,
        llm,
        upload_dir,
    }
}

fn setup_app() -> TestApp {
    setup_app_with(StubStructural::new(0, [0.875, 0.125]), (0.9, 0.3, 0.9), None)
}

const BOUNDARY: &str = "quakesafe-test-boundary";

const REFERENCE_FIELDS: &[(&str, &str)] = &[
    ("City", "台北市"),
    ("Fault", "0"),
    ("Soil_Liquefaction", "0"),
    ("Land_Subsidence", "0"),
    ("Material", "鋼筋混凝土"),
    ("Floor", "3"),
];

/// Build a multipart/form-data body
fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn submit_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/submit")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn chat_request(json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/send_message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn extract_json(body: Body) -> Value {
    serde_json::from_slice(&extract_bytes(body).await).expect("Should parse JSON")
}

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

// =============================================================================
// Health / UI
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app();

    let response = app.router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "quakesafe-web");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_number());
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let app = setup_app();

    let response = app.router.oneshot(get_request("/api/buildinfo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_landing_page() {
    let app = setup_app();

    let response = app.router.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = String::from_utf8(extract_bytes(response.into_body()).await).unwrap();
    assert!(html.contains("building-form"));
    assert!(html.contains("/send_message"));
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_predict_trigger_redirects_without_model_call() {
    let app = setup_app();

    let response = app
        .router
        .oneshot(chat_request(r#"{"message": "我要預測房價"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["reply"], PREDICT_REDIRECT_REPLY);
    assert!(app.llm.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_forwards_to_model() {
    let app = setup_app();

    let response = app
        .router
        .oneshot(chat_request(r#"{"message": "地震來了怎麼辦"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["reply"], "explained: 地震來了怎麼辦 ，請使用繁體中文回答。");
    assert_eq!(app.llm.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_chat_missing_message_is_bad_request() {
    let app = setup_app();

    let response = app.router.oneshot(chat_request(r#"{"text": "hi"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_chat_model_failure_is_bad_gateway_and_reported_by_health() {
    let upload_dir = TempDir::new().unwrap();
    let llm = Arc::new(FailingModel::default());
    let state = AppState::new(
        Arc::new(StubStructural::new(0, [0.9, 0.1])),
        CrackPipeline::new(
            Arc::new(StubDetector(0.1)),
            Arc::new(StubDetector(0.9)),
            Arc::new(StubDetector(0.9)),
        ),
        Explainer::new(llm.clone()),
        UploadStore::new(upload_dir.path()).unwrap(),
    );
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(chat_request(r#"{"message": "hello"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

    let health = router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let body = extract_json(health.into_body()).await;
    assert_eq!(body["status"], "degraded");
    assert!(body["last_error"].as_str().unwrap().contains("model overloaded"));
}

// =============================================================================
// Submit
// =============================================================================

#[tokio::test]
async fn test_submit_full_assessment() {
    let app = setup_app();

    let body = multipart_body(REFERENCE_FIELDS, Some(("wall.png", PNG_BYTES)));
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "大概不會倒");
    assert_eq!(body["prediction"], "系統信心 0.87500");
    assert_eq!(body["image_status"], CrackVerdict::XCrack.message());
    assert_eq!(
        body["img_reply"],
        format!("explained: {}", prompts::crack_prompt(CrackVerdict::XCrack))
    );

    // Classifier saw the encoded reference building
    let seen = app.structural.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].as_row(), [2.0, 0.0, 0.0, 0.0, 4.0, 3.0]);
}

#[tokio::test]
async fn test_submit_at_risk_building() {
    let app = setup_app_with(StubStructural::new(1, [0.2, 0.8]), (0.4, 0.1, 0.1), None);

    let body = multipart_body(REFERENCE_FIELDS, Some(("wall.JPG", PNG_BYTES)));
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "有可能會倒喔");
    assert_eq!(body["prediction"], "系統信心 0.80000");
    assert_eq!(body["image_status"], "這張圖片被判定為沒有裂縫");
}

#[tokio::test]
async fn test_submit_removes_upload_after_request() {
    let app = setup_app();

    let body = multipart_body(REFERENCE_FIELDS, Some(("wall.png", PNG_BYTES)));
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let leftover = std::fs::read_dir(app.upload_dir.path()).unwrap().count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_submit_without_image_part() {
    let app = setup_app();

    let body = multipart_body(REFERENCE_FIELDS, None);
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["message"], "No file part");
}

#[tokio::test]
async fn test_submit_image_sent_as_text_field() {
    let app = setup_app();

    // An `image` part without a filename is a form value, not an upload
    let mut fields = REFERENCE_FIELDS.to_vec();
    fields.push(("image", "wall.png"));
    let body = multipart_body(&fields, None);
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["message"], "No file part");
}

#[tokio::test]
async fn test_submit_with_empty_filename() {
    let app = setup_app();

    let body = multipart_body(REFERENCE_FIELDS, Some(("", b"")));
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["message"], "No selected file");
}

#[tokio::test]
async fn test_submit_disallowed_extension_keeps_structural_result() {
    let app = setup_app();

    let body = multipart_body(REFERENCE_FIELDS, Some(("wall.bmp", PNG_BYTES)));
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "大概不會倒");
    assert_eq!(body["image_status"], "File type not allowed");
    assert!(body.get("prediction").is_none());
    assert!(body.get("img_reply").is_none());
    assert!(app.llm.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_non_numeric_flag_is_bad_request() {
    let app = setup_app();

    let fields: Vec<(&str, &str)> = REFERENCE_FIELDS
        .iter()
        .map(|&(k, v)| if k == "Fault" { (k, "maybe") } else { (k, v) })
        .collect();
    let body = multipart_body(&fields, Some(("wall.png", PNG_BYTES)));
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("Fault"));
    assert!(app.structural.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_missing_field_is_bad_request() {
    let app = setup_app();

    let body = multipart_body(&REFERENCE_FIELDS[..5], Some(("wall.png", PNG_BYTES)));
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("Floor"));
}

#[tokio::test]
async fn test_submit_over_body_limit() {
    let app = setup_app_with(StubStructural::new(0, [0.9, 0.1]), (0.9, 0.9, 0.9), Some(256));

    let large_image = vec![0u8; 4096];
    let body = multipart_body(REFERENCE_FIELDS, Some(("wall.png", &large_image)));
    let response = app.router.oneshot(submit_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
