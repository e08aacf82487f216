//! Bulk waitlist promotion with audit reporting.
//!
//! Used when capacity frees up out-of-band (an organizer raises
//! `max_players`, a scheduled backfill job runs). Selection is strict FIFO
//! over the waitlist; nobody is skipped. Writes are applied per row rather
//! than as one all-or-nothing batch: a single row's store failure is
//! recorded in the report and does not roll back players already promoted.
//! A roster version conflict mid-batch aborts the remainder with
//! [`RegistrationError::ConcurrentModification`] and the caller retries the
//! whole call; because the selection count is recomputed from a fresh
//! snapshot each time, a retry after a fully applied batch promotes nobody
//! twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::db::store::{RegistrationStore, RowChange, StoreError};

use super::error::{RegistrationError, RegistrationResult};
use super::models::{EventId, PlayerId, PromotionReason, Status};
use super::waitlist::WaitlistQueue;

/// Knobs for one promotion pass
#[derive(Debug, Clone, Default)]
pub struct PromotionOptions {
    /// Compute and report the would-be promotions without writing anything
    pub dry_run: bool,
    /// Hard cap on promotions this pass, on top of `slots_available`
    pub max_promotions: Option<u32>,
}

/// Per-player outcome within a promotion pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRecord {
    /// Player the record describes
    pub player_id: PlayerId,
    /// Whether the promotion was written (always false in a dry run)
    pub promoted: bool,
    /// Status after the pass
    pub new_status: Status,
    /// Waitlist position before the pass
    pub previous_ranking_order: u32,
    /// Confirmed rank after the pass, if promoted
    pub new_ranking_order: Option<u32>,
    /// Promotion timestamp, if promoted
    pub promoted_at: Option<DateTime<Utc>>,
    /// Failure detail when the row could not be written
    pub failure: Option<String>,
}

/// Outcome of one promotion pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionReport {
    /// Event the pass ran against
    pub event_id: EventId,
    /// Number of rows actually promoted
    pub total_promoted: u32,
    /// Per-player outcomes in FIFO selection order
    pub records: Vec<PromotionRecord>,
    /// Ordered, human-readable trail of the steps taken
    pub audit_log: Vec<String>,
    /// Whether this was a dry run
    pub dry_run: bool,
}

/// Promotes waitlisted players into freed confirmed slots
pub struct PromotionService {
    store: Arc<dyn RegistrationStore>,
}

impl PromotionService {
    /// Create a service over the given store
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    /// Promote up to `slots_available` waitlisted players, oldest first.
    ///
    /// Promotes `min(waitlist, slots_available, max_promotions)` players;
    /// zero eligible players is a successful empty report, not an error.
    /// After promoting, the remaining waitlist is compacted back to 1..M.
    /// A dry run performs reads only and never touches the roster version.
    pub async fn promote_waitlist(
        &self,
        event_id: EventId,
        slots_available: u32,
        reason: PromotionReason,
        opts: PromotionOptions,
    ) -> RegistrationResult<PromotionReport> {
        let snapshot = self
            .store
            .load_roster(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))?;

        let queue = WaitlistQueue::from_rows(&snapshot.rows);
        let confirmed_count = snapshot.confirmed_count();

        // slots_available is caller-supplied and may be stale; the capacity
        // invariant is enforced here regardless.
        let capacity_left = snapshot.event.max_players.saturating_sub(confirmed_count);
        let cap = opts.max_promotions.unwrap_or(slots_available);
        let n = (queue.len() as u32)
            .min(slots_available)
            .min(cap)
            .min(capacity_left);

        let mut audit_log = vec![format!(
            "event {event_id}: {} waitlisted, {} confirmed, slots_available={slots_available}, \
             cap={cap}, capacity_left={capacity_left}; selecting {n} player(s) by FIFO order",
            queue.len(),
            confirmed_count,
        )];

        if n == 0 {
            audit_log.push("nothing to promote".to_string());
            return Ok(PromotionReport {
                event_id,
                total_promoted: 0,
                records: Vec::new(),
                audit_log,
                dry_run: opts.dry_run,
            });
        }

        let now = Utc::now();
        let mut version = snapshot.version;
        let mut records = Vec::with_capacity(n as usize);
        let mut promoted_ids: Vec<PlayerId> = Vec::new();

        for (idx, waiting) in queue.oldest(n as usize).iter().enumerate() {
            let previous_rank = waiting.ranking_order;
            let new_rank = confirmed_count + idx as u32 + 1;
            let mut updated = (*waiting).clone();
            updated.promote(new_rank, reason, now);

            if opts.dry_run {
                audit_log.push(format!(
                    "dry run: would promote {} from waitlist #{previous_rank} to confirmed \
                     #{new_rank}",
                    waiting.player_id
                ));
                records.push(PromotionRecord {
                    player_id: waiting.player_id,
                    promoted: false,
                    new_status: Status::Confirmed,
                    previous_ranking_order: previous_rank,
                    new_ranking_order: Some(new_rank),
                    promoted_at: None,
                    failure: None,
                });
                continue;
            }

            match self
                .store
                .commit(event_id, version, vec![RowChange::Update(updated)])
                .await
            {
                Ok(new_version) => {
                    version = new_version;
                    promoted_ids.push(waiting.player_id);
                    audit_log.push(format!(
                        "promoted {} from waitlist #{previous_rank} to confirmed #{new_rank} \
                         ({reason})",
                        waiting.player_id
                    ));
                    records.push(PromotionRecord {
                        player_id: waiting.player_id,
                        promoted: true,
                        new_status: Status::Confirmed,
                        previous_ranking_order: previous_rank,
                        new_ranking_order: Some(new_rank),
                        promoted_at: Some(now),
                        failure: None,
                    });
                }
                Err(StoreError::Conflict) => {
                    warn!(
                        "event {event_id}: roster changed during bulk promotion after \
                         {} of {n} row(s)",
                        promoted_ids.len()
                    );
                    return Err(RegistrationError::ConcurrentModification);
                }
                Err(err) => {
                    audit_log.push(format!(
                        "failed to promote {}: {err}; continuing with remaining rows",
                        waiting.player_id
                    ));
                    records.push(PromotionRecord {
                        player_id: waiting.player_id,
                        promoted: false,
                        new_status: Status::Waitlist,
                        previous_ranking_order: previous_rank,
                        new_ranking_order: None,
                        promoted_at: None,
                        failure: Some(err.to_string()),
                    });
                }
            }
        }

        let total_promoted = promoted_ids.len() as u32;

        if !opts.dry_run {
            let corrections = queue.compaction(&promoted_ids);
            if !corrections.is_empty() {
                let mut changes = Vec::with_capacity(corrections.len());
                for (player_id, rank) in &corrections {
                    if let Some(row) = snapshot.row(*player_id) {
                        let mut updated = row.clone();
                        updated.ranking_order = *rank;
                        changes.push(RowChange::Update(updated));
                    }
                }
                self.store.commit(event_id, version, changes).await?;
                audit_log.push(format!(
                    "compacted waitlist ranks for {} remaining player(s)",
                    corrections.len()
                ));
            }
            info!("event {event_id}: bulk promotion wrote {total_promoted} of {n} row(s)");
        } else {
            audit_log.push("dry run: no changes written".to_string());
        }

        Ok(PromotionReport {
            event_id,
            total_promoted,
            records,
            audit_log,
            dry_run: opts.dry_run,
        })
    }
}
