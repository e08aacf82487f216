//! In-memory [`RegistrationStore`] for tests and local development.
//!
//! Keeps the same per-event version discipline as the Postgres store, so the
//! conflict behavior the services depend on can be exercised without a
//! database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::registration::models::{Event, EventId, PlayerId, PlayerStatus, RosterSnapshot};

use super::store::{RegistrationStore, RowChange, StoreError, StoreResult};

#[derive(Debug, Default)]
struct EventState {
    event: Option<Event>,
    rows: HashMap<PlayerId, PlayerStatus>,
    version: u64,
}

/// In-memory registration store
#[derive(Clone, Default)]
pub struct MemoryRegistrationStore {
    state: Arc<Mutex<HashMap<EventId, EventState>>>,
}

impl MemoryRegistrationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace an event's metadata
    pub async fn put_event(&self, event: Event) {
        let mut state = self.state.lock().await;
        let id = event.id;
        state.entry(id).or_default().event = Some(event);
    }

    /// Seed a registration row directly, bypassing the services
    pub async fn put_row(&self, row: PlayerStatus) {
        let mut state = self.state.lock().await;
        let entry = state.entry(row.event_id).or_default();
        entry.rows.insert(row.player_id, row);
        entry.version += 1;
    }

    /// Current roster version for an event (0 if never written)
    pub async fn version(&self, event_id: EventId) -> u64 {
        let state = self.state.lock().await;
        state.get(&event_id).map(|s| s.version).unwrap_or(0)
    }
}

#[async_trait]
impl RegistrationStore for MemoryRegistrationStore {
    async fn load_event(&self, event_id: EventId) -> StoreResult<Option<Event>> {
        let state = self.state.lock().await;
        Ok(state.get(&event_id).and_then(|s| s.event.clone()))
    }

    async fn load_roster(&self, event_id: EventId) -> StoreResult<Option<RosterSnapshot>> {
        let state = self.state.lock().await;
        let Some(event_state) = state.get(&event_id) else {
            return Ok(None);
        };
        let Some(event) = event_state.event.clone() else {
            return Ok(None);
        };
        Ok(Some(RosterSnapshot {
            event,
            rows: event_state.rows.values().cloned().collect(),
            version: event_state.version,
        }))
    }

    async fn commit(
        &self,
        event_id: EventId,
        expected_version: u64,
        changes: Vec<RowChange>,
    ) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let event_state = state
            .get_mut(&event_id)
            .ok_or_else(|| StoreError::Unavailable(format!("unknown event {event_id}")))?;

        if event_state.version != expected_version {
            return Err(StoreError::Conflict);
        }

        // Validate the whole batch before touching anything so a bad batch
        // leaves the roster untouched, matching the transactional store.
        for change in &changes {
            match change {
                RowChange::Insert(row) => {
                    if event_state.rows.contains_key(&row.player_id) {
                        return Err(StoreError::Unavailable(format!(
                            "row already exists for player {}",
                            row.player_id
                        )));
                    }
                }
                RowChange::Update(row) => {
                    if !event_state.rows.contains_key(&row.player_id) {
                        return Err(StoreError::Unavailable(format!(
                            "no row for player {}",
                            row.player_id
                        )));
                    }
                }
                RowChange::Delete { .. } => {}
            }
        }

        for change in changes {
            match change {
                RowChange::Insert(row) | RowChange::Update(row) => {
                    event_state.rows.insert(row.player_id, row);
                }
                RowChange::Delete { player_id } => {
                    event_state.rows.remove(&player_id);
                }
            }
        }

        event_state.version += 1;
        Ok(event_state.version)
    }
}
