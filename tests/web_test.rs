use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

use emotive::web::{router, AppState};
use emotive::{Analysis, ClassifierError, EmotionModel, EmotionScorer, ScoreResult};

const LABELS: [&str; 6] = ["sadness", "joy", "love", "anger", "fear", "surprise"];

struct JoyfulModel {
    labels: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl EmotionModel for JoyfulModel {
    fn classify(&self, _text: &str) -> Result<Vec<ScoreResult>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scores = [0.02, 0.91, 0.03, 0.02, 0.01, 0.01];
        Ok(self.labels.iter()
            .zip(scores)
            .map(|(label, score)| ScoreResult::new(label.clone(), score))
            .collect())
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

struct BrokenModel;

impl EmotionModel for BrokenModel {
    fn classify(&self, _text: &str) -> Result<Vec<ScoreResult>, ClassifierError> {
        Err(ClassifierError::ModelError("Failed to run model".into()))
    }

    fn labels(&self) -> &[String] {
        &[]
    }
}

fn joyful_state() -> (AppState, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let model: Box<dyn EmotionModel> = Box::new(JoyfulModel {
        labels: LABELS.iter().map(|l| l.to_string()).collect(),
        calls: Arc::clone(&calls),
    });
    (AppState::new(Arc::new(EmotionScorer::new(model))), calls)
}

fn broken_state() -> AppState {
    let model: Box<dyn EmotionModel> = Box::new(BrokenModel);
    AppState::new(Arc::new(EmotionScorer::new(model)))
}

fn form_request(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn json_request(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_page() {
    let (state, _) = joyful_state();
    let response = router(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("<textarea"));
    assert!(page.contains("Analyze Emotions"));
    assert!(!page.contains("<svg"));
}

#[tokio::test]
async fn test_form_analysis_renders_chart() {
    let (state, calls) = joyful_state();
    let response = router(state)
        .oneshot(form_request("text=I+am+so+happy+today%21"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Dominant Emotion: <strong>joy</strong> (0.91)"));
    assert_eq!(page.matches(r#"class="bar""#).count(), LABELS.len());
    assert!(page.contains("<li><strong>sadness:</strong> 0.02</li>"));
    assert!(page.contains("I am so happy today!</textarea>"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_blank_form_shows_warning() {
    let (state, calls) = joyful_state();
    let app = router(state);

    for body in ["text=", "text=+++", ""] {
        let response = app.clone().oneshot(form_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Please enter some text before analyzing."));
        assert!(!page.contains("<svg"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_form_model_failure() {
    let response = router(broken_state())
        .oneshot(form_request("text=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let page = body_text(response).await;
    assert!(page.contains("Analysis failed: Model error: Failed to run model"));
}

#[tokio::test]
async fn test_json_analysis() {
    let (state, _) = joyful_state();
    let response = router(state)
        .oneshot(json_request(r#"{"text": "I am so happy today!"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let analysis: Analysis = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(analysis.dominant.label, "joy");
    assert_eq!(analysis.scores.len(), LABELS.len());
    assert_eq!(analysis.scores[0].label, "sadness");
}

#[tokio::test]
async fn test_json_empty_input() {
    let (state, calls) = joyful_state();
    let response = router(state)
        .oneshot(json_request(r#"{"text": "  "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Please enter some text before analyzing.");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_json_bad_payloads_get_json_errors() {
    let (state, calls) = joyful_state();
    let app = router(state);

    let cases = [
        (r#"{}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"text": 42}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"text": "#, StatusCode::BAD_REQUEST),
    ];
    for (body, status) in cases {
        let response = app.clone().oneshot(json_request(body)).await.unwrap();
        assert_eq!(response.status(), status, "payload {}", body);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(!body["error"].as_str().unwrap().is_empty());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_json_requires_json_content_type() {
    let (state, _) = joyful_state();
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "text/plain")
        .body(Body::from(r#"{"text": "hello"}"#))
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_json_model_failure() {
    let response = router(broken_state())
        .oneshot(json_request(r#"{"text": "hello"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Model error: Failed to run model");
}

#[tokio::test]
async fn test_health_lists_labels() {
    let (state, _) = joyful_state();
    let response = router(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["labels"].as_array().unwrap().len(), LABELS.len());
}
