//! Pure waitlist ordering logic.
//!
//! Queue position is the stored `ranking_order`, kept dense (1..N). For rows
//! that entered the waitlist through registration that order equals ascending
//! `registered_at`, which is what FIFO fairness promises; rows demoted from
//! the confirmed roster join at the tail regardless of their registration
//! time. `registered_at` and `player_id` break ties so the order stays total
//! even if stored ranks are ever duplicated. Nothing in this module performs
//! I/O; the services build a [`WaitlistQueue`] from a roster snapshot and ask
//! it for selections and rank corrections.

use super::models::{PlayerId, PlayerStatus, Status};

/// A FIFO view over the waitlisted rows of one event
#[derive(Debug)]
pub struct WaitlistQueue<'a> {
    entries: Vec<&'a PlayerStatus>,
}

impl<'a> WaitlistQueue<'a> {
    /// Build the queue from roster rows, keeping only waitlisted entries
    pub fn from_rows(rows: &'a [PlayerStatus]) -> Self {
        let mut entries: Vec<&PlayerStatus> = rows
            .iter()
            .filter(|r| r.status == Status::Waitlist)
            .collect();
        entries.sort_by(|a, b| {
            a.ranking_order
                .cmp(&b.ranking_order)
                .then(a.registered_at.cmp(&b.registered_at))
                .then(a.player_id.cmp(&b.player_id))
        });
        Self { entries }
    }

    /// Number of waitlisted players
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the waitlist is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The queue in FIFO order
    pub fn entries(&self) -> &[&'a PlayerStatus] {
        &self.entries
    }

    /// The `n` oldest entries in FIFO order (fewer if the queue is shorter)
    pub fn oldest(&self, n: usize) -> &[&'a PlayerStatus] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Queue position a newly waitlisted player would receive (1-indexed)
    pub fn next_rank(&self) -> u32 {
        self.entries.len() as u32 + 1
    }

    /// Rank corrections needed so positions run 1..N with no gaps.
    ///
    /// Returns `(player_id, corrected_rank)` pairs only for rows whose stored
    /// rank disagrees with their queue position. Skipping the `excluded`
    /// players computes the post-removal compaction without materializing an
    /// intermediate roster.
    pub fn compaction(&self, excluded: &[PlayerId]) -> Vec<(PlayerId, u32)> {
        self.entries
            .iter()
            .filter(|e| !excluded.contains(&e.player_id))
            .enumerate()
            .filter_map(|(idx, e)| {
                let rank = idx as u32 + 1;
                (e.ranking_order != rank).then_some((e.player_id, rank))
            })
            .collect()
    }
}
