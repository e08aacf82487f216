//! # Open Play
//!
//! Event-registration admission and waitlist-promotion engine for open-play
//! sessions, where confirmed players enter the roster in complete groups
//! (four by default) and everyone else queues FIFO on a waitlist.
//!
//! ## Core modules
//!
//! - [`registration`]: the four services — admission, cancellation
//!   rebalancing, bulk promotion, organizer ranking — plus the pure
//!   waitlist ordering logic and the error taxonomy.
//! - [`db`]: the [`RegistrationStore`](db::RegistrationStore) persistence
//!   contract with Postgres and in-memory implementations.
//!
//! ## Concurrency
//!
//! Every operation reads one versioned roster snapshot and commits its
//! writes conditioned on that version. Two operations racing on the same
//! event (for example, two registrants both trying to complete the last
//! group) resolve to exactly one winner; the loser gets a retryable
//! [`RegistrationError`](registration::RegistrationError)::`ConcurrentModification`.

/// Persistence: store contract, Postgres pool, in-memory store.
pub mod db;
pub use db::{Database, DatabaseConfig, MemoryRegistrationStore, RegistrationStore};

/// Admission, rebalancing, promotion and ranking services.
pub mod registration;
pub use registration::{
    AdmissionEngine, CancellationRebalancer, Event, EventId, GroupPolicy, PlayerId, PlayerStatus,
    PromotionReason, PromotionService, RankingService, RegistrationError, RegistrationResult,
    Status,
};
