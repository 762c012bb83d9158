use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::{EligibilityRequest, EligibilityService, ServiceError};
use crate::sources::AccountStore;

/// Router exposing eligibility checks and the event listing.
pub fn eligibility_router<S>(service: Arc<EligibilityService<S>>) -> Router
where
    S: AccountStore + 'static,
{
    Router::new()
        .route("/api/v1/eligibility", post(check_handler::<S>))
        .route("/api/v1/events", get(events_handler::<S>))
        .with_state(service)
}

pub(crate) async fn check_handler<S>(
    State(service): State<Arc<EligibilityService<S>>>,
    axum::Json(request): axum::Json<EligibilityRequest>,
) -> Response
where
    S: AccountStore + 'static,
{
    match service.check(&request) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(ServiceError::UnknownEvent(event)) => {
            let payload = json!({
                "error": "unknown event",
                "event": event,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(ServiceError::Subject(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(other) => {
            tracing::error!(error = %other, "eligibility check failed");
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn events_handler<S>(
    State(service): State<Arc<EligibilityService<S>>>,
) -> Response
where
    S: AccountStore + 'static,
{
    (StatusCode::OK, axum::Json(service.events())).into_response()
}
