//! Registration module: admission, cancellation rebalancing, bulk promotion
//! and organizer ranking for open-play events.
//!
//! All four services follow the same shape: read one [`RosterSnapshot`]
//! through the [`RegistrationStore`](crate::db::RegistrationStore), decide,
//! and commit the dependent writes conditioned on the snapshot's version.
//! A stale version surfaces as
//! [`RegistrationError::ConcurrentModification`], the only retryable error
//! in the taxonomy; [`retry_on_conflict`] implements the caller-side capped
//! backoff. Events never share state, so operations on different events run
//! fully concurrently.
//!
//! ## Invariants
//!
//! After every committed operation:
//! - confirmed count never exceeds the event's `max_players`;
//! - events with reserves disallowed have an empty waitlist;
//! - waitlist ranks are dense (1..N) in queue order;
//! - the confirmed count is a multiple of the group size unless the
//!   waitlist is empty;
//! - promotion history (`promoted_at`/`promotion_reason`) is present exactly
//!   on confirmed rows that went through the waitlist.
//!
//! ## Example
//!
//! ```no_run
//! use open_play::db::MemoryRegistrationStore;
//! use open_play::registration::{AdmissionEngine, GroupPolicy};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryRegistrationStore::new());
//!     let engine = AdmissionEngine::new(store, GroupPolicy::default());
//!
//!     let outcome = engine.register(Uuid::new_v4(), Uuid::new_v4()).await?;
//!     println!("admitted as {}", outcome.status);
//!     Ok(())
//! }
//! ```

pub mod admission;
pub mod cancellation;
pub mod error;
pub mod models;
pub mod promotion;
pub mod ranking;
pub mod waitlist;

pub use admission::{AdmissionEngine, AdmissionOutcome};
pub use cancellation::{CancellationOutcome, CancellationRebalancer};
pub use error::{RegistrationError, RegistrationResult};
pub use models::{
    Event, EventId, GroupPolicy, PlayerId, PlayerStatus, PromotionReason, RosterSnapshot, Status,
};
pub use promotion::{PromotionOptions, PromotionRecord, PromotionReport, PromotionService};
pub use ranking::{AdminId, Comparator, RankingService};
pub use waitlist::WaitlistQueue;

use std::future::Future;
use std::time::Duration;

/// Re-run an operation while it fails with
/// [`RegistrationError::ConcurrentModification`], up to `max_attempts`
/// attempts with exponential backoff. Every other error returns immediately;
/// terminal errors are not safe to retry blindly.
pub async fn retry_on_conflict<T, F, Fut>(max_attempts: u32, mut op: F) -> RegistrationResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RegistrationResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                attempt += 1;
                let backoff = Duration::from_millis(20u64 << attempt.min(6));
                log::debug!("retrying after conflict (attempt {attempt}, backoff {backoff:?})");
                tokio::time::sleep(backoff).await;
            }
            other => return other,
        }
    }
}
