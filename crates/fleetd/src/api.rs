//! REST API.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness of subnet resolution and pricing |
//! | GET | `/api/v1/templates` | List template names |
//! | GET | `/api/v1/templates/{name}/instance-types` | Resolve a template |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::warn;

use fleetgrid_instancetype::InstanceTypeError;

use crate::daemon::Daemon;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub daemon: Arc<Daemon>,
}

pub fn build_router(daemon: Arc<Daemon>) -> Router {
    let state = ApiState { daemon };

    let api_routes = Router::new()
        .route("/templates", get(list_templates))
        .route("/templates/{name}/instance-types", get(resolve_instance_types))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(healthz).with_state(state))
}

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn status_for(err: &InstanceTypeError) -> StatusCode {
    match err {
        InstanceTypeError::NoMatchingSubnets { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET /healthz
pub async fn healthz(State(state): State<ApiState>) -> impl IntoResponse {
    match state.daemon.provider.check_liveness() {
        Ok(()) => ApiResponse::ok("live").into_response(),
        Err(e) => {
            warn!(component = %e.component, reason = %e.reason, "liveness check failed");
            error_response(&e.to_string(), StatusCode::SERVICE_UNAVAILABLE).into_response()
        }
    }
}

/// GET /api/v1/templates
pub async fn list_templates(State(state): State<ApiState>) -> impl IntoResponse {
    let mut names: Vec<&str> = state.daemon.templates.keys().map(String::as_str).collect();
    names.sort_unstable();
    ApiResponse::ok(names).into_response()
}

/// GET /api/v1/templates/{name}/instance-types
pub async fn resolve_instance_types(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.daemon.resolve(&name).await {
        Some(Ok(instance_types)) => ApiResponse::ok(instance_types.as_slice()).into_response(),
        Some(Err(e)) => {
            warn!(template = %name, error = %e, "instance type resolution failed");
            error_response(&e.to_string(), status_for(&e)).into_response()
        }
        None => error_response("template not found", StatusCode::NOT_FOUND).into_response(),
    }
}
