//! Registration and cancellation handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use open_play::registration::{
    retry_on_conflict, AdmissionEngine, CancellationRebalancer, PromotionReason, Status,
};

use super::{error_response, AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub player_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub player_id: Uuid,
    pub status: Status,
    pub ranking_order: u32,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub player_id: Uuid,
    pub cancelled_status: Status,
    pub demoted: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RosterEntry {
    pub player_id: Uuid,
    pub ranking_order: u32,
    pub registered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_reason: Option<PromotionReason>,
}

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub event_id: Uuid,
    pub max_players: u32,
    pub confirmed: Vec<RosterEntry>,
    pub waitlist: Vec<RosterEntry>,
}

/// `POST /api/events/{id}/registrations`
pub async fn register(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    let engine = AdmissionEngine::new(state.store.clone(), state.policy);
    let result = retry_on_conflict(state.max_retry_attempts, || {
        engine.register(event_id, request.player_id)
    })
    .await;

    match result {
        Ok(outcome) => {
            crate::metrics::registrations_total(outcome.status.as_str());
            (
                StatusCode::CREATED,
                Json(RegisterResponse {
                    player_id: request.player_id,
                    status: outcome.status,
                    ranking_order: outcome.ranking_order,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}

/// `DELETE /api/events/{id}/registrations/{player_id}`
pub async fn cancel(
    State(state): State<AppState>,
    Path((event_id, player_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let rebalancer = CancellationRebalancer::new(state.store.clone(), state.policy);
    let result = retry_on_conflict(state.max_retry_attempts, || {
        rebalancer.cancel(event_id, player_id)
    })
    .await;

    match result {
        Ok(outcome) => {
            crate::metrics::cancellations_total(outcome.demoted.len());
            (
                StatusCode::OK,
                Json(CancelResponse {
                    player_id,
                    cancelled_status: outcome.cancelled_status,
                    demoted: outcome.demoted,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}

/// `GET /api/events/{id}/roster`
pub async fn roster(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.load_roster(event_id).await {
        Ok(Some(snapshot)) => {
            fn entry(row: &open_play::PlayerStatus) -> RosterEntry {
                RosterEntry {
                    player_id: row.player_id,
                    ranking_order: row.ranking_order,
                    registered_at: row.registered_at,
                    promoted_at: row.promoted_at,
                    promotion_reason: row.promotion_reason,
                }
            }

            let confirmed: Vec<RosterEntry> =
                snapshot.confirmed_rows().into_iter().map(entry).collect();
            let mut waitlist: Vec<RosterEntry> = snapshot
                .rows
                .iter()
                .filter(|r| r.status == Status::Waitlist)
                .map(entry)
                .collect();
            waitlist.sort_by_key(|e| e.ranking_order);

            (
                StatusCode::OK,
                Json(RosterResponse {
                    event_id,
                    max_players: snapshot.event.max_players,
                    confirmed,
                    waitlist,
                }),
            )
                .into_response()
        }
        Ok(None) => error_response(&open_play::RegistrationError::EventNotFound(event_id))
            .into_response(),
        Err(err) => error_response(&err.into()).into_response(),
    }
}
