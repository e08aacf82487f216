//! Organizer gate for the admin endpoints.
//!
//! Checks the `X-Admin-Token` header against the configured shared secret.
//! Real authorization policy (who is an organizer of which event) is the
//! caller's concern; this shim only keeps the endpoints off the open
//! internet and reports failures in the standard error shape.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use open_play::registration::RegistrationError;

use super::{error_response, AppState};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Reject requests that do not carry the organizer token
pub async fn admin_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let supplied = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    if supplied != Some(state.admin_token.as_str()) {
        return error_response(&RegistrationError::NotAuthorized).into_response();
    }

    next.run(request).await
}
