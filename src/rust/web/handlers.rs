use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use log::{debug, error};
use serde::Deserialize;
use serde_json::{json, Value};

use super::render::{render_page, Outcome};
use super::AppState;
use crate::classifier::ClassifierError;
use crate::scorer::{Analysis, ScoreError};

#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// Inference is CPU-bound, so it runs on the blocking pool
async fn run_analysis(state: &AppState, text: String) -> Result<Analysis, ScoreError> {
    let scorer = state.scorer.clone();
    tokio::task::spawn_blocking(move || scorer.analyze(&text))
        .await
        .unwrap_or_else(|e| {
            Err(ScoreError::Classifier(ClassifierError::PredictionError(format!(
                "analysis task failed: {}",
                e
            ))))
        })
}

pub(super) async fn index() -> Html<String> {
    Html(render_page("", &Outcome::Idle))
}

pub(super) async fn analyze_form(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> Response {
    debug!("Form analysis request ({} chars)", form.text.len());
    match run_analysis(&state, form.text.clone()).await {
        Ok(analysis) => Html(render_page(&form.text, &Outcome::Success(&analysis))).into_response(),
        Err(ScoreError::EmptyInput) => {
            let message = ScoreError::EmptyInput.to_string();
            Html(render_page(&form.text, &Outcome::Warning(&message))).into_response()
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            let message = e.to_string();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_page(&form.text, &Outcome::Failure(&message))),
            )
                .into_response()
        }
    }
}

/// Every JSON API failure answers with `{"error": "..."}`
pub(super) enum ApiError {
    Analysis(ScoreError),
    Payload(JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Analysis(ScoreError::EmptyInput) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ScoreError::EmptyInput.to_string())
            }
            Self::Analysis(e) => {
                error!("Analysis failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Payload(rejection) => {
                debug!("Rejected JSON payload: {}", rejection.body_text());
                (rejection.status(), rejection.body_text())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub(super) async fn analyze_json(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Analysis>, ApiError> {
    let Json(request) = payload.map_err(ApiError::Payload)?;
    run_analysis(&state, request.text).await.map(Json).map_err(ApiError::Analysis)
}

pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "labels": state.scorer.labels(),
    }))
}
