//! Organizer ranking endpoints.
//!
//! Ratings arrive in the request body and feed the core's opaque
//! comparator; this server never computes or stores skill numbers.

use std::cmp::Ordering;
use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use open_play::registration::{retry_on_conflict, RankingService};

use super::{error_response, AppState};

#[derive(Debug, Deserialize)]
pub struct AdminRequest {
    pub admin_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSkill {
    pub player_id: Uuid,
    /// Coarse skill tier (higher is stronger)
    pub skill_level: i32,
    /// Fine-grained external rating, e.g. DUPR
    pub rating: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReorganizeRequest {
    pub admin_id: Uuid,
    pub rankings: Vec<PlayerSkill>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub admin_id: Uuid,
    pub player_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub success: bool,
    pub changed: u32,
}

/// `POST /api/admin/events/{id}/rankings/initial`
pub async fn set_initial_rankings(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<AdminRequest>,
) -> impl IntoResponse {
    let service = RankingService::new(state.store.clone());
    let result = retry_on_conflict(state.max_retry_attempts, || {
        service.set_initial_rankings(event_id, request.admin_id)
    })
    .await;

    match result {
        Ok(changed) => {
            crate::metrics::ranking_operations_total("initial");
            (
                StatusCode::OK,
                Json(RankingResponse {
                    success: true,
                    changed,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}

/// `POST /api/admin/events/{id}/rankings/reorganize`
pub async fn reorganize(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<ReorganizeRequest>,
) -> impl IntoResponse {
    let skills: HashMap<Uuid, (i32, f64)> = request
        .rankings
        .iter()
        .map(|s| (s.player_id, (s.skill_level, s.rating)))
        .collect();

    // Strongest first; players without a supplied rating sort last and keep
    // their current relative order (the sort is stable).
    let comparator = |a: &open_play::PlayerStatus, b: &open_play::PlayerStatus| {
        match (skills.get(&a.player_id), skills.get(&b.player_id)) {
            (Some((al, ar)), Some((bl, br))) => bl
                .cmp(al)
                .then(br.partial_cmp(ar).unwrap_or(Ordering::Equal)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    };

    let service = RankingService::new(state.store.clone());
    let result = retry_on_conflict(state.max_retry_attempts, || {
        service.reorganize(event_id, request.admin_id, &comparator)
    })
    .await;

    match result {
        Ok(changed) => {
            crate::metrics::ranking_operations_total("reorganize");
            (
                StatusCode::OK,
                Json(RankingResponse {
                    success: true,
                    changed,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}

/// `POST /api/admin/events/{id}/rankings/reorder`
pub async fn reorder(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> impl IntoResponse {
    let service = RankingService::new(state.store.clone());
    let result = retry_on_conflict(state.max_retry_attempts, || {
        service.reorder(event_id, request.admin_id, request.player_ids.clone())
    })
    .await;

    match result {
        Ok(()) => {
            crate::metrics::ranking_operations_total("reorder");
            (
                StatusCode::OK,
                Json(RankingResponse {
                    success: true,
                    changed: request.player_ids.len() as u32,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}
