//! Store trait definitions for testability and dependency injection.
//!
//! The registration services never talk to the database directly; they read
//! one [`RosterSnapshot`] and commit a batch of row changes conditioned on
//! the snapshot's version. The version guard is what turns the read-decide-
//! write sequence into a serializable-per-event operation: a commit whose
//! expected version no longer matches fails with [`StoreError::Conflict`]
//! and the caller re-reads and retries. Different events never share a
//! version row, so operations on different events proceed independently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use thiserror::Error;

use crate::registration::models::{
    Event, EventId, PlayerId, PlayerStatus, RosterSnapshot,
};

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The roster version moved between snapshot and commit (retryable)
    #[error("conflicting concurrent roster update")]
    Conflict,

    /// The backing store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Store result alias
pub type StoreResult<T> = Result<T, StoreError>;

/// One mutation within a conditional roster commit
#[derive(Debug, Clone)]
pub enum RowChange {
    /// Create a new registration row
    Insert(PlayerStatus),
    /// Overwrite the mutable fields of an existing row
    Update(PlayerStatus),
    /// Hard-delete a row (cancellation is terminal)
    Delete {
        /// Player whose row is removed
        player_id: PlayerId,
    },
}

/// Persistence contract for player registration rows.
///
/// Implementations must apply `commit` atomically for the event and reject
/// it with [`StoreError::Conflict`] when `expected_version` is stale.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Load event metadata, if the event exists
    async fn load_event(&self, event_id: EventId) -> StoreResult<Option<Event>>;

    /// Load a consistent snapshot of the event's roster
    async fn load_roster(&self, event_id: EventId) -> StoreResult<Option<RosterSnapshot>>;

    /// Apply a batch of row changes if the roster version is still
    /// `expected_version`; returns the new version
    async fn commit(
        &self,
        event_id: EventId,
        expected_version: u64,
        changes: Vec<RowChange>,
    ) -> StoreResult<u64>;
}

/// Default PostgreSQL implementation of [`RegistrationStore`]
pub struct PgRegistrationStore {
    pool: PgPool,
}

impl PgRegistrationStore {
    /// Wrap a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// PostgreSQL code for serialization failures under SERIALIZABLE isolation
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(SQLSTATE_SERIALIZATION_FAILURE) {
            return StoreError::Conflict;
        }
    }
    StoreError::Database(err)
}

fn decode_status_row(row: &PgRow) -> StoreResult<PlayerStatus> {
    let status: String = row.get("status");
    let reason: Option<String> = row.get("promotion_reason");
    let ranking_order: i32 = row.get("ranking_order");
    Ok(PlayerStatus {
        event_id: row.get("event_id"),
        player_id: row.get("player_id"),
        status: status
            .parse()
            .map_err(|e: String| StoreError::Database(sqlx::Error::Decode(e.into())))?,
        ranking_order: ranking_order as u32,
        registered_at: row.get::<DateTime<Utc>, _>("registered_at"),
        promoted_at: row.get("promoted_at"),
        promotion_reason: reason
            .map(|r| {
                r.parse()
                    .map_err(|e: String| StoreError::Database(sqlx::Error::Decode(e.into())))
            })
            .transpose()?,
    })
}

fn decode_event_row(row: &PgRow) -> Event {
    let max_players: i32 = row.get("max_players");
    Event {
        id: row.get("id"),
        max_players: max_players as u32,
        allow_reserves: row.get("allow_reserves"),
        registration_open: row.get("registration_open"),
    }
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn load_event(&self, event_id: EventId) -> StoreResult<Option<Event>> {
        let row = sqlx::query(
            "SELECT id, max_players, allow_reserves, registration_open FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(|r| decode_event_row(&r)))
    }

    async fn load_roster(&self, event_id: EventId) -> StoreResult<Option<RosterSnapshot>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let event_row = sqlx::query(
            "SELECT id, max_players, allow_reserves, registration_open FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let Some(event_row) = event_row else {
            return Ok(None);
        };

        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM roster_versions WHERE event_id = $1")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx)?;

        let rows = sqlx::query(
            r#"
            SELECT event_id, player_id, status, ranking_order, registered_at,
                   promoted_at, promotion_reason
            FROM player_status
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;

        let rows = rows
            .iter()
            .map(decode_status_row)
            .collect::<StoreResult<Vec<PlayerStatus>>>()?;

        Ok(Some(RosterSnapshot {
            event: decode_event_row(&event_row),
            rows,
            version: version.unwrap_or(0) as u64,
        }))
    }

    async fn commit(
        &self,
        event_id: EventId,
        expected_version: u64,
        changes: Vec<RowChange>,
    ) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        // Version guard first: locks the event's version row and detects a
        // stale snapshot before any row is touched.
        let new_version: Option<i64> = if expected_version == 0 {
            sqlx::query_scalar(
                r#"
                INSERT INTO roster_versions (event_id, version) VALUES ($1, 1)
                ON CONFLICT (event_id) DO UPDATE
                    SET version = roster_versions.version + 1
                    WHERE roster_versions.version = 0
                RETURNING version
                "#,
            )
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx)?
        } else {
            sqlx::query_scalar(
                "UPDATE roster_versions SET version = version + 1
                 WHERE event_id = $1 AND version = $2
                 RETURNING version",
            )
            .bind(event_id)
            .bind(expected_version as i64)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx)?
        };

        let Some(new_version) = new_version else {
            tx.rollback().await.ok();
            return Err(StoreError::Conflict);
        };

        for change in changes {
            match change {
                RowChange::Insert(row) => {
                    sqlx::query(
                        r#"
                        INSERT INTO player_status
                            (event_id, player_id, status, ranking_order, registered_at,
                             promoted_at, promotion_reason)
                        VALUES ($1, $2, $3, $4, $5, $6, $7)
                        "#,
                    )
                    .bind(row.event_id)
                    .bind(row.player_id)
                    .bind(row.status.as_str())
                    .bind(row.ranking_order as i32)
                    .bind(row.registered_at)
                    .bind(row.promoted_at)
                    .bind(row.promotion_reason.map(|r| r.as_str()))
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx)?;
                }
                RowChange::Update(row) => {
                    sqlx::query(
                        r#"
                        UPDATE player_status
                        SET status = $3, ranking_order = $4, promoted_at = $5,
                            promotion_reason = $6
                        WHERE event_id = $1 AND player_id = $2
                        "#,
                    )
                    .bind(row.event_id)
                    .bind(row.player_id)
                    .bind(row.status.as_str())
                    .bind(row.ranking_order as i32)
                    .bind(row.promoted_at)
                    .bind(row.promotion_reason.map(|r| r.as_str()))
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx)?;
                }
                RowChange::Delete { player_id } => {
                    sqlx::query("DELETE FROM player_status WHERE event_id = $1 AND player_id = $2")
                        .bind(event_id)
                        .bind(player_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(map_sqlx)?;
                }
            }
        }

        tx.commit().await.map_err(map_sqlx)?;
        Ok(new_version as u64)
    }
}
