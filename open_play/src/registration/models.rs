//! Data models for event registration and waitlist tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Event ID type
pub type EventId = Uuid;

/// Player ID type
pub type PlayerId = Uuid;

/// Registration status for a player within one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Holds a confirmed roster slot
    Confirmed,
    /// Queued for a slot, FIFO by registration time
    Waitlist,
    /// Marked absent by an organizer; keeps the row but no slot
    Absent,
}

impl Status {
    /// Stable string form used in the database and API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Confirmed => "confirmed",
            Status::Waitlist => "waitlist",
            Status::Absent => "absent",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Status::Confirmed),
            "waitlist" => Ok(Status::Waitlist),
            "absent" => Ok(Status::Absent),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Why a player was moved from the waitlist to the confirmed roster.
///
/// Closed set: free-form reason strings from callers are parsed into one of
/// these variants at the API boundary, defaulting to [`PromotionReason::Manual`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionReason {
    /// The registrant completed a full group and the whole group was admitted
    GroupCompleted,
    /// An organizer raised the event capacity
    CapacityIncreased,
    /// A confirmed player cancelled and the slot was backfilled
    CancellationBackfill,
    /// Organizer-initiated promotion with no specific trigger
    Manual,
}

impl PromotionReason {
    /// Stable string form used in the database and audit logs
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionReason::GroupCompleted => "group_completed",
            PromotionReason::CapacityIncreased => "capacity_increased",
            PromotionReason::CancellationBackfill => "cancellation_backfill",
            PromotionReason::Manual => "manual",
        }
    }
}

impl fmt::Display for PromotionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group_completed" => Ok(PromotionReason::GroupCompleted),
            "capacity_increased" => Ok(PromotionReason::CapacityIncreased),
            "cancellation_backfill" => Ok(PromotionReason::CancellationBackfill),
            "manual" => Ok(PromotionReason::Manual),
            other => Err(format!("unknown promotion reason: {other}")),
        }
    }
}

/// One registration row, keyed by `(event_id, player_id)`.
///
/// `ranking_order` is unique within an `(event, status)` partition: for
/// confirmed rows it is the display/skill order, for waitlisted rows it is
/// the FIFO queue position (1-indexed, no gaps). `registered_at` is set once
/// at creation and is the sole tie-breaker for FIFO fairness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatus {
    /// Event this row belongs to
    pub event_id: EventId,
    /// Player this row belongs to
    pub player_id: PlayerId,
    /// Current registration status
    pub status: Status,
    /// Position within the `(event, status)` partition, 1-indexed
    pub ranking_order: u32,
    /// Registration timestamp, immutable after creation
    pub registered_at: DateTime<Utc>,
    /// Set when the row transitioned waitlist -> confirmed, cleared on demotion
    pub promoted_at: Option<DateTime<Utc>>,
    /// Paired with `promoted_at`
    pub promotion_reason: Option<PromotionReason>,
}

impl PlayerStatus {
    /// Create a fresh waitlisted row at the given queue position
    pub fn waitlisted(
        event_id: EventId,
        player_id: PlayerId,
        ranking_order: u32,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            player_id,
            status: Status::Waitlist,
            ranking_order,
            registered_at,
            promoted_at: None,
            promotion_reason: None,
        }
    }

    /// Create a fresh confirmed row with no promotion history
    /// (the immediate-confirm admission path)
    pub fn confirmed(
        event_id: EventId,
        player_id: PlayerId,
        ranking_order: u32,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            player_id,
            status: Status::Confirmed,
            ranking_order,
            registered_at,
            promoted_at: None,
            promotion_reason: None,
        }
    }

    /// Transition this row to confirmed, stamping the promotion history
    pub fn promote(&mut self, ranking_order: u32, reason: PromotionReason, at: DateTime<Utc>) {
        self.status = Status::Confirmed;
        self.ranking_order = ranking_order;
        self.promoted_at = Some(at);
        self.promotion_reason = Some(reason);
    }

    /// Transition this row back to the waitlist, clearing the promotion history
    pub fn demote(&mut self, ranking_order: u32) {
        self.status = Status::Waitlist;
        self.ranking_order = ranking_order;
        self.promoted_at = None;
        self.promotion_reason = None;
    }
}

/// Event metadata, read-only to this subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Capacity of the confirmed roster
    pub max_players: u32,
    /// Whether waitlisted registrations are permitted at all
    pub allow_reserves: bool,
    /// Gate for new registrations
    pub registration_open: bool,
}

/// Group admission policy.
///
/// Confirmed players enter the roster in complete groups of `group_size`;
/// a partial group is tolerated only when the waitlist is empty. Injected
/// into the services rather than hard-coded so the domain rule lives in
/// exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPolicy {
    group_size: u32,
}

impl GroupPolicy {
    /// Create a policy with the given group size (minimum 1)
    pub fn new(group_size: u32) -> Self {
        Self {
            group_size: group_size.max(1),
        }
    }

    /// Number of players admitted together
    pub fn group_size(&self) -> u32 {
        self.group_size
    }

    /// How many confirmed players exceed a whole number of groups
    pub fn excess(&self, confirmed_count: u32) -> u32 {
        confirmed_count % self.group_size
    }
}

impl Default for GroupPolicy {
    fn default() -> Self {
        Self::new(4)
    }
}

/// A consistent multi-row read of one event's roster.
///
/// `version` increments on every committed change to the roster and is the
/// token a subsequent conditional commit is validated against.
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    /// Event metadata at snapshot time
    pub event: Event,
    /// All registration rows for the event
    pub rows: Vec<PlayerStatus>,
    /// Optimistic-concurrency token for this event's roster
    pub version: u64,
}

impl RosterSnapshot {
    /// Number of confirmed rows
    pub fn confirmed_count(&self) -> u32 {
        self.count(Status::Confirmed)
    }

    /// Number of waitlisted rows
    pub fn waitlist_count(&self) -> u32 {
        self.count(Status::Waitlist)
    }

    fn count(&self, status: Status) -> u32 {
        self.rows.iter().filter(|r| r.status == status).count() as u32
    }

    /// Look up the row for a player, if any
    pub fn row(&self, player_id: PlayerId) -> Option<&PlayerStatus> {
        self.rows.iter().find(|r| r.player_id == player_id)
    }

    /// Confirmed rows sorted by ranking order
    pub fn confirmed_rows(&self) -> Vec<&PlayerStatus> {
        let mut rows: Vec<&PlayerStatus> = self
            .rows
            .iter()
            .filter(|r| r.status == Status::Confirmed)
            .collect();
        rows.sort_by_key(|r| r.ranking_order);
        rows
    }
}
