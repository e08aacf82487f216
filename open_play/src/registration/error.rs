//! Error taxonomy shared by the registration services.
//!
//! Only [`RegistrationError::ConcurrentModification`] is safe to retry;
//! every other variant is terminal for the attempted operation.

use thiserror::Error;

use crate::db::store::StoreError;

use super::models::{EventId, PlayerId, Status};

/// Registration errors
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    #[error("player {player_id} is already registered ({status})")]
    AlreadyRegistered {
        player_id: PlayerId,
        status: Status,
    },

    #[error("player {0} is not registered for this event")]
    NotRegistered(PlayerId),

    #[error("registration is closed for this event")]
    RegistrationClosed,

    #[error("the roster changed concurrently; retry the operation")]
    ConcurrentModification,

    #[error("supplied player ordering does not match the confirmed roster")]
    InvalidOrderSet,

    #[error("caller is not authorized for organizer operations")]
    NotAuthorized,

    #[error("registration store unavailable: {0}")]
    StoreUnavailable(String),
}

impl RegistrationError {
    /// Whether the caller may retry the operation (with backoff)
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistrationError::ConcurrentModification)
    }
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => RegistrationError::ConcurrentModification,
            StoreError::Unavailable(msg) => RegistrationError::StoreUnavailable(msg),
            StoreError::Database(e) => RegistrationError::StoreUnavailable(e.to_string()),
        }
    }
}

/// Registration result alias
pub type RegistrationResult<T> = Result<T, RegistrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(RegistrationError::ConcurrentModification.is_retryable());
        assert!(!RegistrationError::RegistrationClosed.is_retryable());
        assert!(!RegistrationError::InvalidOrderSet.is_retryable());
        assert!(!RegistrationError::StoreUnavailable("down".into()).is_retryable());
    }

    #[test]
    fn test_store_conflict_maps_to_concurrent_modification() {
        let err: RegistrationError = StoreError::Conflict.into();
        assert!(matches!(err, RegistrationError::ConcurrentModification));
    }

    #[test]
    fn test_store_unavailable_maps_through() {
        let err: RegistrationError = StoreError::Unavailable("connection refused".into()).into();
        match err {
            RegistrationError::StoreUnavailable(msg) => {
                assert!(msg.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
