//! Cancellation handling and group-size rebalancing.
//!
//! Cancellation is terminal: the row is deleted, not soft-deleted. When a
//! confirmed player leaves and breaks a group, the rebalancer demotes the
//! *highest*-ranked confirmed players back to the waitlist tail. Demoting
//! from the top of the rank range (rather than at random or from the bottom)
//! keeps the best-ranked complete groups intact when a group breaks; that is
//! a deliberate policy, not an accident of implementation.

use std::sync::Arc;

use log::info;

use crate::db::store::{RegistrationStore, RowChange};

use super::error::{RegistrationError, RegistrationResult};
use super::models::{EventId, GroupPolicy, PlayerId, Status};
use super::waitlist::WaitlistQueue;

/// Result of a cancellation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationOutcome {
    /// Status the cancelled player held
    pub cancelled_status: Status,
    /// Players demoted to the waitlist to restore the group invariant,
    /// in their relative confirmed-rank order
    pub demoted: Vec<PlayerId>,
}

/// Handles a player's departure and restores the group-size invariant
pub struct CancellationRebalancer {
    store: Arc<dyn RegistrationStore>,
    policy: GroupPolicy,
}

impl CancellationRebalancer {
    /// Create a rebalancer over the given store and group policy
    pub fn new(store: Arc<dyn RegistrationStore>, policy: GroupPolicy) -> Self {
        Self { store, policy }
    }

    /// Cancel a player's registration.
    ///
    /// A confirmed departure demotes the excess (`confirmed % group_size`)
    /// highest-ranked confirmed players to the waitlist tail in their
    /// relative rank order, clearing their promotion history. Events that
    /// disallow reserves skip demotion entirely: the waitlist must stay
    /// empty, and the partial group is tolerated for exactly that reason.
    /// A waitlisted departure compacts the remaining queue to 1..N.
    pub async fn cancel(
        &self,
        event_id: EventId,
        player_id: PlayerId,
    ) -> RegistrationResult<CancellationOutcome> {
        let snapshot = self
            .store
            .load_roster(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))?;

        let row = snapshot
            .row(player_id)
            .ok_or(RegistrationError::NotRegistered(player_id))?
            .clone();

        let mut changes = vec![RowChange::Delete { player_id }];
        let mut demoted_ids = Vec::new();

        match row.status {
            Status::Confirmed => {
                let remaining: Vec<_> = snapshot
                    .confirmed_rows()
                    .into_iter()
                    .filter(|r| r.player_id != player_id)
                    .collect();
                let excess = self.policy.excess(remaining.len() as u32);

                if excess > 0 && snapshot.event.allow_reserves {
                    let queue = WaitlistQueue::from_rows(&snapshot.rows);
                    let tail_base = queue.len() as u32;
                    // Highest-ranked `excess` players, kept in relative order.
                    let demoted = &remaining[remaining.len() - excess as usize..];
                    for (idx, victim) in demoted.iter().enumerate() {
                        let mut row = (*victim).clone();
                        row.demote(tail_base + idx as u32 + 1);
                        demoted_ids.push(row.player_id);
                        changes.push(RowChange::Update(row));
                    }
                }
            }
            Status::Waitlist => {
                let queue = WaitlistQueue::from_rows(&snapshot.rows);
                changes.extend(queue.compaction(&[player_id]).into_iter().filter_map(
                    |(shifted_player, rank)| {
                        snapshot.row(shifted_player).map(|row| {
                            let mut updated = row.clone();
                            updated.ranking_order = rank;
                            RowChange::Update(updated)
                        })
                    },
                ));
            }
            Status::Absent => {}
        }

        self.store.commit(event_id, snapshot.version, changes).await?;

        if !demoted_ids.is_empty() {
            info!(
                "event {event_id}: cancellation of {player_id} demoted {} player(s) \
                 to the waitlist",
                demoted_ids.len()
            );
        }

        Ok(CancellationOutcome {
            cancelled_status: row.status,
            demoted: demoted_ids,
        })
    }
}
