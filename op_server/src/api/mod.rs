//! HTTP API for the registration server.
//!
//! Thin axum surface over the `open_play` services:
//!
//! - `POST   /api/events/{id}/registrations` — register a player
//! - `DELETE /api/events/{id}/registrations/{player_id}` — cancel
//! - `GET    /api/events/{id}/roster` — roster snapshot
//! - `POST   /api/events/{id}/promotions` — bulk waitlist promotion
//!   (business failures return 200 with `success: false`; only transport
//!   faults map to 5xx)
//! - `POST   /api/admin/events/{id}/rankings/initial` — seed ranking order
//! - `POST   /api/admin/events/{id}/rankings/reorganize` — skill re-sort
//! - `POST   /api/admin/events/{id}/rankings/reorder` — explicit ordering
//! - `GET    /health`
//!
//! Organizer routes are gated by the `X-Admin-Token` header; authorization
//! policy beyond that shared secret lives outside this service.

pub mod admin;
pub mod middleware;
pub mod promotions;
pub mod registrations;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use open_play::registration::{GroupPolicy, RegistrationError};
use open_play::RegistrationStore;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Registration store backing the services
    pub store: Arc<dyn RegistrationStore>,
    /// Group admission policy
    pub policy: GroupPolicy,
    /// Shared secret for organizer routes
    pub admin_token: String,
    /// Conflict retry cap applied around each operation
    pub max_retry_attempts: u32,
}

/// Wire form of a terminal error
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable message
    pub error: String,
    /// Whether the caller may retry with backoff
    pub retryable: bool,
}

/// Map a service error onto an HTTP status and wire body
pub fn error_response(err: &RegistrationError) -> (StatusCode, Json<ErrorBody>) {
    let (status, code) = match err {
        RegistrationError::EventNotFound(_) => (StatusCode::NOT_FOUND, "event_not_found"),
        RegistrationError::NotRegistered(_) => (StatusCode::NOT_FOUND, "not_registered"),
        RegistrationError::AlreadyRegistered { .. } => {
            (StatusCode::CONFLICT, "already_registered")
        }
        RegistrationError::RegistrationClosed => (StatusCode::FORBIDDEN, "registration_closed"),
        RegistrationError::ConcurrentModification => {
            (StatusCode::CONFLICT, "concurrent_modification")
        }
        RegistrationError::InvalidOrderSet => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_order_set")
        }
        RegistrationError::NotAuthorized => (StatusCode::FORBIDDEN, "not_authorized"),
        RegistrationError::StoreUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
        }
    };
    crate::metrics::registration_errors_total(code);
    (
        status,
        Json(ErrorBody {
            code,
            error: err.to_string(),
            retryable: err.is_retryable(),
        }),
    )
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/api/admin/events/{id}/rankings/initial",
            post(admin::set_initial_rankings),
        )
        .route(
            "/api/admin/events/{id}/rankings/reorganize",
            post(admin::reorganize),
        )
        .route(
            "/api/admin/events/{id}/rankings/reorder",
            post(admin::reorder),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_gate,
        ));

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/events/{id}/registrations",
            post(registrations::register),
        )
        .route(
            "/api/events/{id}/registrations/{player_id}",
            delete(registrations::cancel),
        )
        .route("/api/events/{id}/roster", get(registrations::roster))
        .route("/api/events/{id}/promotions", post(promotions::promote))
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
