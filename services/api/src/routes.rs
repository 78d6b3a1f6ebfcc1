use crate::infra::AppState;
use crate::page::{form_with_defaults, parse_form, render_page, Outcome};
use axum::extract::Form;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use credit_risk::evaluation::evaluation_router;
use credit_risk::ApplicantSubmission;
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info};

pub(crate) fn with_page_routes(state: AppState) -> Router {
    evaluation_router(state.evaluator.clone())
        .route("/", get(index))
        .route("/evaluate", post(evaluate_form))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn index() -> Html<String> {
    Html(render_page(&ApplicantSubmission::default(), None))
}

pub(crate) async fn evaluate_form(
    Extension(state): Extension<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    let submission = match parse_form(&fields) {
        Ok(submission) => submission,
        Err(message) => {
            info!(error = %message, "form submission rejected");
            let page = render_page(&form_with_defaults(&fields), Some(Outcome::Rejected(&message)));
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page));
        }
    };

    match state.evaluator.evaluate(&submission) {
        Ok(assessment) => {
            info!(
                verdict = %assessment.verdict,
                probability_percent = assessment.probability_percent(),
                "form submission evaluated"
            );
            let page = render_page(&submission, Some(Outcome::Assessed(&assessment)));
            (StatusCode::OK, Html(page))
        }
        Err(err) if err.is_rejection() => {
            info!(error = %err, "form submission rejected");
            let message = err.to_string();
            let page = render_page(&submission, Some(Outcome::Rejected(&message)));
            (StatusCode::UNPROCESSABLE_ENTITY, Html(page))
        }
        Err(err) => {
            error!(error = %err, "form evaluation failed");
            let message = err.to_string();
            let page = render_page(&submission, Some(Outcome::Failed(&message)));
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page))
        }
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}
