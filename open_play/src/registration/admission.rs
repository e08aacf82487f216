//! Admission decisions for new registrations.
//!
//! Confirmed players enter the roster in complete groups (see
//! [`GroupPolicy`]): a registration either completes a group, in which case
//! the whole group is atomically promoted and confirmed, or joins the tail of
//! the waitlist. The snapshot-read plus versioned commit makes two racing
//! group completions impossible; the loser observes
//! [`RegistrationError::ConcurrentModification`] and retries against the new
//! roster.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use crate::db::store::{RegistrationStore, RowChange};

use super::error::{RegistrationError, RegistrationResult};
use super::models::{
    EventId, GroupPolicy, PlayerId, PlayerStatus, PromotionReason, Status,
};
use super::waitlist::WaitlistQueue;

/// Result of an admission decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionOutcome {
    /// Status granted to the new registrant
    pub status: Status,
    /// Rank assigned within that status partition
    pub ranking_order: u32,
}

/// Decides confirm-vs-waitlist for new registrations
pub struct AdmissionEngine {
    store: Arc<dyn RegistrationStore>,
    policy: GroupPolicy,
}

impl AdmissionEngine {
    /// Create an engine over the given store and group policy
    pub fn new(store: Arc<dyn RegistrationStore>, policy: GroupPolicy) -> Self {
        Self { store, policy }
    }

    /// Register a player for an event.
    ///
    /// Preconditions: the event exists, `registration_open` is set, and the
    /// player holds no row for this event yet (re-registration is rejected
    /// with [`RegistrationError::AlreadyRegistered`], never duplicated).
    ///
    /// If this registration is the final member of a group and the confirmed
    /// roster has room for the whole group, the waiting group-mates are
    /// promoted (stamped `group_completed`) and the new player is confirmed
    /// directly with no promotion history. Otherwise the player joins the
    /// waitlist tail; for events that disallow reserves that outcome is
    /// rejected with [`RegistrationError::RegistrationClosed`] instead.
    pub async fn register(
        &self,
        event_id: EventId,
        player_id: PlayerId,
    ) -> RegistrationResult<AdmissionOutcome> {
        let snapshot = self
            .store
            .load_roster(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))?;

        if !snapshot.event.registration_open {
            return Err(RegistrationError::RegistrationClosed);
        }

        if let Some(existing) = snapshot.row(player_id) {
            return Err(RegistrationError::AlreadyRegistered {
                player_id,
                status: existing.status,
            });
        }

        let confirmed_count = snapshot.confirmed_count();
        let queue = WaitlistQueue::from_rows(&snapshot.rows);
        let group_size = self.policy.group_size();
        let now = Utc::now();

        let completes_group = queue.len() as u32 == group_size - 1
            && confirmed_count + group_size <= snapshot.event.max_players;

        if completes_group {
            let mut changes = Vec::with_capacity(group_size as usize);
            for (idx, waiting) in queue.oldest(group_size as usize - 1).iter().enumerate() {
                let mut promoted = (*waiting).clone();
                promoted.promote(
                    confirmed_count + idx as u32 + 1,
                    PromotionReason::GroupCompleted,
                    now,
                );
                changes.push(RowChange::Update(promoted));
            }

            let rank = confirmed_count + group_size;
            changes.push(RowChange::Insert(PlayerStatus::confirmed(
                event_id, player_id, rank, now,
            )));

            self.store.commit(event_id, snapshot.version, changes).await?;
            info!(
                "event {event_id}: player {player_id} completed a group of {group_size}, \
                 confirmed at rank {rank}"
            );
            return Ok(AdmissionOutcome {
                status: Status::Confirmed,
                ranking_order: rank,
            });
        }

        if !snapshot.event.allow_reserves {
            return Err(RegistrationError::RegistrationClosed);
        }

        let rank = queue.next_rank();
        self.store
            .commit(
                event_id,
                snapshot.version,
                vec![RowChange::Insert(PlayerStatus::waitlisted(
                    event_id, player_id, rank, now,
                ))],
            )
            .await?;
        debug!("event {event_id}: player {player_id} waitlisted at position {rank}");

        Ok(AdmissionOutcome {
            status: Status::Waitlist,
            ranking_order: rank,
        })
    }
}
