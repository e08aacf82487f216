//! Bulk waitlist promotion endpoint.
//!
//! Business failures (unknown event) return `200` with `success: false` so
//! job runners can distinguish "the request was understood and refused" from
//! a transport fault; only infrastructure errors map to 5xx.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use open_play::registration::{
    retry_on_conflict, PromotionOptions, PromotionReason, PromotionRecord, PromotionService,
    RegistrationError,
};

use super::{error_response, AppState};

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub slots_available: u32,
    pub promotion_reason: Option<String>,
    #[serde(default)]
    pub test_mode: bool,
    pub max_promotions: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub success: bool,
    pub message: String,
    pub total_promoted: u32,
    pub results: Vec<PromotionRecord>,
    pub audit_log: Vec<String>,
}

/// `POST /api/events/{id}/promotions`
pub async fn promote(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<PromoteRequest>,
) -> impl IntoResponse {
    let reason = match request.promotion_reason.as_deref() {
        None => PromotionReason::Manual,
        Some(s) => match s.parse() {
            Ok(reason) => reason,
            Err(detail) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(PromoteResponse {
                        success: false,
                        message: detail,
                        total_promoted: 0,
                        results: Vec::new(),
                        audit_log: Vec::new(),
                    }),
                )
                    .into_response();
            }
        },
    };

    let service = PromotionService::new(state.store.clone());
    let opts = PromotionOptions {
        dry_run: request.test_mode,
        max_promotions: request.max_promotions,
    };
    let result = retry_on_conflict(state.max_retry_attempts, || {
        service.promote_waitlist(event_id, request.slots_available, reason, opts.clone())
    })
    .await;

    match result {
        Ok(report) => {
            if !report.dry_run {
                crate::metrics::promotions_total(reason.as_str(), report.total_promoted as u64);
            }
            (
                StatusCode::OK,
                Json(PromoteResponse {
                    success: true,
                    message: format!(
                        "{} player(s) promoted{}",
                        report.total_promoted,
                        if report.dry_run { " (test mode)" } else { "" }
                    ),
                    total_promoted: report.total_promoted,
                    results: report.records,
                    audit_log: report.audit_log,
                }),
            )
                .into_response()
        }
        // Business failure: the request was valid but refers to nothing.
        Err(RegistrationError::EventNotFound(id)) => (
            StatusCode::OK,
            Json(PromoteResponse {
                success: false,
                message: format!("event not found: {id}"),
                total_promoted: 0,
                results: Vec::new(),
                audit_log: Vec::new(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
