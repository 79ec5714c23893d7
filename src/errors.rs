//! Typed error hierarchy for craic.
//!
//! Three top-level enums cover the three subsystems:
//! - `StoreError` — document store backends (memory, SQLite, Firestore)
//! - `PlacesError` — places provider requests
//! - `CheckInError` — check-in synchronization on top of a store

use thiserror::Error;

/// Errors from a check-in document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid document key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Remote store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the places provider.
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("No places API key configured")]
    MissingApiKey,

    #[error("Places request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Places provider returned status {status}{}", message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: String,
        message: Option<String>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from check-in synchronization.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("Place identifier must not be empty")]
    EmptyPlaceId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The call site a check-in failure came from, used to pick the message
/// shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInAction {
    Load,
    SaveTags,
    RegisterCheckIn,
}

impl CheckInAction {
    /// Static, human-readable message for a failure at this call site.
    pub fn failure_message(self) -> &'static str {
        match self {
            CheckInAction::Load => "Failed to load pub details",
            CheckInAction::SaveTags => "Failed to save tags",
            CheckInAction::RegisterCheckIn => "Failed to increment crowd",
        }
    }
}

impl CheckInError {
    /// Message to display for this error at the given call site.
    ///
    /// An empty place id always reads "Invalid pub" regardless of where it
    /// was caught.
    pub fn user_message(&self, action: CheckInAction) -> &'static str {
        match self {
            CheckInError::EmptyPlaceId => "Invalid pub",
            CheckInError::Store(_) => action.failure_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_invalid_key_carries_key() {
        let err = StoreError::InvalidKey {
            key: "a/b".into(),
            reason: "contains '/'".into(),
        };
        match &err {
            StoreError::InvalidKey { key, .. } => assert_eq!(key, "a/b"),
            _ => panic!("Expected InvalidKey"),
        }
        assert!(err.to_string().contains("a/b"));
    }

    #[test]
    fn places_status_error_includes_message_when_present() {
        let err = PlacesError::Status {
            status: "REQUEST_DENIED".into(),
            message: Some("The provided API key is invalid.".into()),
        };
        assert_eq!(
            err.to_string(),
            "Places provider returned status REQUEST_DENIED: The provided API key is invalid."
        );

        let bare = PlacesError::Status {
            status: "OVER_QUERY_LIMIT".into(),
            message: None,
        };
        assert_eq!(
            bare.to_string(),
            "Places provider returned status OVER_QUERY_LIMIT"
        );
    }

    #[test]
    fn checkin_error_converts_from_store_error() {
        let err: CheckInError = StoreError::LockPoisoned.into();
        assert!(matches!(err, CheckInError::Store(StoreError::LockPoisoned)));
    }

    #[test]
    fn user_message_depends_on_call_site() {
        let err: CheckInError = StoreError::Malformed("x".into()).into();
        assert_eq!(err.user_message(CheckInAction::SaveTags), "Failed to save tags");
        assert_eq!(
            err.user_message(CheckInAction::RegisterCheckIn),
            "Failed to increment crowd"
        );
        assert_eq!(
            err.user_message(CheckInAction::Load),
            "Failed to load pub details"
        );
    }

    #[test]
    fn empty_place_id_reads_invalid_pub_everywhere() {
        let err = CheckInError::EmptyPlaceId;
        assert_eq!(err.user_message(CheckInAction::SaveTags), "Invalid pub");
        assert_eq!(err.user_message(CheckInAction::Load), "Invalid pub");
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&StoreError::LockPoisoned);
        assert_std_error(&PlacesError::MissingApiKey);
        assert_std_error(&CheckInError::EmptyPlaceId);
    }
}
