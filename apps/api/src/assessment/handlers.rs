//! Axum route handlers for the Assessment API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::assessment::pipeline::run_analysis;
use crate::errors::AppError;
use crate::state::AppState;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing user_responses or question_origins";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Answers to the mixed PHQ-9 / GAD-7 / PSS-10 questionnaire.
/// Both blobs are free-form; the model infers their structure.
#[derive(Debug, Deserialize)]
pub struct AssessmentRequest {
    #[serde(default)]
    pub user_responses: Option<String>,
    #[serde(default)]
    pub question_origins: Option<String>,
}

impl AssessmentRequest {
    /// Returns `(user_responses, question_origins)` when both are present and non-empty.
    pub fn validate(&self) -> Result<(&str, &str), AppError> {
        match (present(&self.user_responses), present(&self.question_origins)) {
            (Some(responses), Some(origins)) => Ok((responses, origins)),
            _ => Err(AppError::Validation(MISSING_FIELDS_MESSAGE.to_string())),
        }
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct AssessmentResponse {
    pub result: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze
///
/// Validates the questionnaire payload and runs the retrieval-grounded assessment.
/// - 400 when either field is missing or empty
/// - 500 when the index is unavailable or the body cannot be parsed
/// - 200 otherwise, including generation failures (reported inside `result`)
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AssessmentRequest>, JsonRejection>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::Internal(anyhow::anyhow!(rejection.body_text())))?;

    let (user_responses, question_origins) = request.validate()?;

    let result = run_analysis(
        &state.index,
        state.llm.as_ref(),
        user_responses,
        question_origins,
    )
    .await?;

    Ok(Json(AssessmentResponse { result }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DocumentChunk;
    use crate::retrieval::index::{EmbeddingIndex, IndexError, IndexState};
    use crate::routes::build_router;
    use crate::test_support::{app_state, FailingCompletion, KeywordEmbedder, StubCompletion};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    async fn ready_index() -> IndexState {
        let chunks = vec![DocumentChunk {
            text: "Mental health assessment guidance: seek support early.".to_string(),
            source: "trydata.txt".to_string(),
            page: None,
            index: 0,
        }];
        IndexState::Ready(
            EmbeddingIndex::build(chunks, Arc::new(KeywordEmbedder::new(10)))
                .await
                .unwrap(),
        )
    }

    async fn post_analyze(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_validate_accepts_both_fields() {
        let request = AssessmentRequest {
            user_responses: Some("Q1: 2".to_string()),
            question_origins: Some("Q1: PHQ-9".to_string()),
        };
        assert_eq!(request.validate().unwrap(), ("Q1: 2", "Q1: PHQ-9"));
    }

    #[tokio::test]
    async fn test_missing_or_empty_fields_are_rejected() {
        let bodies = [
            r#"{}"#,
            r#"{"user_responses": "Q1: 2"}"#,
            r#"{"question_origins": "Q1: PHQ-9"}"#,
            r#"{"user_responses": "", "question_origins": "Q1: PHQ-9"}"#,
            r#"{"user_responses": "Q1: 2", "question_origins": ""}"#,
            r#"{"user_responses": null, "question_origins": "Q1: PHQ-9"}"#,
        ];

        for body in bodies {
            let llm = Arc::new(StubCompletion::new(json!({ "answer": "unused" })));
            let app = build_router(app_state(ready_index().await, llm.clone()));

            let (status, json) = post_analyze(app, body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json, json!({ "error": "Missing user_responses or question_origins" }));
            assert_eq!(llm.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_valid_request_returns_stubbed_completion() {
        let llm = Arc::new(StubCompletion::new(json!({ "answer": "ASSESSMENT SUMMARY: mild" })));
        let app = build_router(app_state(ready_index().await, llm.clone()));

        let (status, json) = post_analyze(
            app,
            r#"{"user_responses": "Q1: 2, Q2: 3", "question_origins": "Q1: PHQ-9, Q2: GAD-7"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "result": "ASSESSMENT SUMMARY: mild" }));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_index_is_server_error() {
        let llm = Arc::new(StubCompletion::new(json!({ "answer": "unused" })));
        let app = build_router(app_state(
            IndexState::Failed(IndexError::EmptyCorpus),
            llm.clone(),
        ));

        let (status, json) = post_analyze(
            app,
            r#"{"user_responses": "Q1: 2", "question_origins": "Q1: PHQ-9"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({ "error": "Vector store is not available" }));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_generation_fault_is_reported_with_ok_status() {
        let llm = Arc::new(FailingCompletion::new("connection reset by peer"));
        let expected = format!("Error during analysis: {}", llm.error_message());
        let app = build_router(app_state(ready_index().await, llm));

        let (status, json) = post_analyze(
            app,
            r#"{"user_responses": "Q1: 2", "question_origins": "Q1: PHQ-9"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "result": expected }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_server_error() {
        let llm = Arc::new(StubCompletion::new(json!({ "answer": "unused" })));
        let app = build_router(app_state(ready_index().await, llm));

        let (status, json) = post_analyze(app, "{not json").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().is_some_and(|m| !m.is_empty()));
    }
}
