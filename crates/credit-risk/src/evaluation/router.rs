use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use super::views::RiskAssessmentView;
use super::RiskEvaluator;
use crate::applicant::ApplicantSubmission;

/// Router exposing the JSON evaluation API.
pub fn evaluation_router(evaluator: Arc<RiskEvaluator>) -> Router {
    Router::new()
        .route("/api/v1/evaluate", post(evaluate_handler))
        .route("/api/v1/model", get(model_handler))
        .with_state(evaluator)
}

pub(crate) async fn evaluate_handler(
    State(evaluator): State<Arc<RiskEvaluator>>,
    payload: Result<axum::Json<ApplicantSubmission>, JsonRejection>,
) -> Response {
    let submission = match payload {
        Ok(axum::Json(submission)) => submission,
        Err(rejection) => {
            info!(error = %rejection.body_text(), "malformed evaluation payload");
            let payload = json!({
                "error": rejection.body_text(),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    match evaluator.evaluate(&submission) {
        Ok(assessment) => {
            let view = RiskAssessmentView::new(&assessment, Utc::now());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) if err.is_rejection() => {
            info!(error = %err, "applicant submission rejected");
            let payload = json!({
                "error": err.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(err) => {
            error!(error = %err, "evaluation failed");
            let payload = json!({
                "error": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn model_handler(State(evaluator): State<Arc<RiskEvaluator>>) -> Response {
    match evaluator.model_summary() {
        Some(summary) => (StatusCode::OK, axum::Json(summary.clone())).into_response(),
        None => {
            let payload = json!({
                "error": "model metadata unavailable",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicant::{FeatureRow, UnseenCategoryPolicy};
    use crate::model::{Classifier, InferenceError};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct RatioClassifier;

    impl Classifier for RatioClassifier {
        fn predict(&self, row: &FeatureRow) -> Result<u8, InferenceError> {
            let [_, positive] = self.predict_proba(row)?;
            Ok(u8::from(positive > 0.5))
        }

        fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError> {
            let ratio = row.get("loan_percent_income").unwrap_or(0.0).min(1.0);
            Ok([1.0 - ratio, ratio])
        }
    }

    fn router() -> Router {
        evaluation_router(Arc::new(RiskEvaluator::new(
            Arc::new(RatioClassifier),
            UnseenCategoryPolicy::Reject,
        )))
    }

    async fn post_json(router: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/evaluate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds");
        let response = router.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    fn submission_json() -> serde_json::Value {
        serde_json::to_value(ApplicantSubmission::default()).expect("serializes")
    }

    #[tokio::test]
    async fn evaluate_returns_assessment_view() {
        let (status, body) = post_json(router(), submission_json()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verdict"], "PAID_OFF");
        assert_eq!(body["label"], 0);
        assert_eq!(body["probability_percent"], 20.0);
        assert_eq!(body["summary"], "LOW RISK: 20.00% probability of default");
    }

    #[tokio::test]
    async fn evaluate_rejects_out_of_range_input() {
        let mut payload = submission_json();
        payload["age"] = serde_json::json!(17);

        let (status, body) = post_json(router(), payload).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "age must be between 18 and 100 (got 17)");
    }

    #[tokio::test]
    async fn evaluate_rejects_unknown_category() {
        let mut payload = submission_json();
        payload["loan_intent"] = serde_json::json!("WEDDING");

        let (status, body) = post_json(router(), payload).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "unknown category 'WEDDING' for loan_intent");
    }

    #[tokio::test]
    async fn evaluate_reports_mistyped_fields_as_json() {
        let mut payload = submission_json();
        payload["age"] = serde_json::json!(25.5);

        let (status, body) = post_json(router(), payload).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let message = body["error"].as_str().expect("error message is a string");
        assert!(message.contains("age"), "{message}");
    }

    #[tokio::test]
    async fn evaluate_reports_missing_fields_as_json() {
        let mut payload = submission_json();
        payload
            .as_object_mut()
            .expect("submission is an object")
            .remove("loan_grade");

        let (status, body) = post_json(router(), payload).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let message = body["error"].as_str().expect("error message is a string");
        assert!(message.contains("loan_grade"), "{message}");
    }

    #[tokio::test]
    async fn model_endpoint_without_metadata_is_not_found() {
        let request = Request::builder()
            .uri("/api/v1/model")
            .body(Body::empty())
            .expect("request builds");
        let response = router().oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
