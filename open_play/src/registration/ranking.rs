//! Organizer-controlled ordering of the confirmed roster.
//!
//! Confirmed `ranking_order` is display/skill order and is independent of
//! admission: nothing here ever changes a player's status or touches the
//! waitlist. Skill comparison is an opaque comparator supplied by the caller
//! (ratings live outside this subsystem). Authorization also happens in the
//! caller; `admin_id` is recorded for the audit trail only.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::db::store::{RegistrationStore, RowChange};

use super::error::{RegistrationError, RegistrationResult};
use super::models::{EventId, PlayerId, PlayerStatus};

/// Organizer/admin ID type
pub type AdminId = Uuid;

/// Opaque ordering over confirmed players, e.g. skill level then rating
pub type Comparator<'a> = &'a (dyn Fn(&PlayerStatus, &PlayerStatus) -> Ordering + Send + Sync);

/// Rewrites confirmed ranking order on organizer request
pub struct RankingService {
    store: Arc<dyn RegistrationStore>,
}

impl RankingService {
    /// Create a service over the given store
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    /// Re-sort the confirmed roster with the supplied comparator and rewrite
    /// `ranking_order` to 1..N. The sort is stable: players the comparator
    /// considers equal keep their current relative order. Returns the number
    /// of rows whose rank changed.
    pub async fn reorganize(
        &self,
        event_id: EventId,
        admin_id: AdminId,
        comparator: Comparator<'_>,
    ) -> RegistrationResult<u32> {
        self.rewrite_confirmed(event_id, admin_id, "reorganize", |rows| {
            rows.sort_by(|a, b| comparator(a, b));
        })
        .await
    }

    /// Seed confirmed ranking order from registration time (oldest first).
    /// Returns the number of rows whose rank changed.
    pub async fn set_initial_rankings(
        &self,
        event_id: EventId,
        admin_id: AdminId,
    ) -> RegistrationResult<u32> {
        self.rewrite_confirmed(event_id, admin_id, "initial rankings", |rows| {
            rows.sort_by(|a, b| {
                a.registered_at
                    .cmp(&b.registered_at)
                    .then(a.player_id.cmp(&b.player_id))
            });
        })
        .await
    }

    /// Apply an explicit full ordering of the confirmed roster.
    ///
    /// The supplied ID sequence must match the current confirmed roster
    /// exactly (same players, no duplicates, nobody missing or extra);
    /// anything else fails with [`RegistrationError::InvalidOrderSet`] and
    /// leaves the roster untouched. Players cannot be added or removed
    /// through this path.
    pub async fn reorder(
        &self,
        event_id: EventId,
        admin_id: AdminId,
        ordered_player_ids: Vec<PlayerId>,
    ) -> RegistrationResult<()> {
        let snapshot = self
            .store
            .load_roster(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))?;

        let confirmed = snapshot.confirmed_rows();
        let current: HashSet<PlayerId> = confirmed.iter().map(|r| r.player_id).collect();
        let supplied: HashSet<PlayerId> = ordered_player_ids.iter().copied().collect();

        if ordered_player_ids.len() != confirmed.len()
            || supplied.len() != ordered_player_ids.len()
            || supplied != current
        {
            return Err(RegistrationError::InvalidOrderSet);
        }

        let mut changes = Vec::new();
        for (idx, player_id) in ordered_player_ids.iter().enumerate() {
            let rank = idx as u32 + 1;
            if let Some(row) = confirmed.iter().find(|r| r.player_id == *player_id) {
                if row.ranking_order != rank {
                    let mut updated = (*row).clone();
                    updated.ranking_order = rank;
                    changes.push(RowChange::Update(updated));
                }
            }
        }

        let changed = changes.len();
        if !changes.is_empty() {
            self.store.commit(event_id, snapshot.version, changes).await?;
        }
        info!(
            "event {event_id}: admin {admin_id} reordered confirmed roster \
             ({changed} rank(s) changed)"
        );
        Ok(())
    }

    async fn rewrite_confirmed<F>(
        &self,
        event_id: EventId,
        admin_id: AdminId,
        what: &str,
        sort: F,
    ) -> RegistrationResult<u32>
    where
        F: FnOnce(&mut Vec<&PlayerStatus>),
    {
        let snapshot = self
            .store
            .load_roster(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))?;

        let mut confirmed = snapshot.confirmed_rows();
        sort(&mut confirmed);

        let mut changes = Vec::new();
        for (idx, row) in confirmed.iter().enumerate() {
            let rank = idx as u32 + 1;
            if row.ranking_order != rank {
                let mut updated = (*row).clone();
                updated.ranking_order = rank;
                changes.push(RowChange::Update(updated));
            }
        }

        let changed = changes.len() as u32;
        if !changes.is_empty() {
            self.store.commit(event_id, snapshot.version, changes).await?;
        }
        info!("event {event_id}: admin {admin_id} applied {what} ({changed} rank(s) changed)");
        Ok(changed)
    }
}
