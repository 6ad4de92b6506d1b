//! Error taxonomy for the training engine.
//!
//! Every fallible core operation returns [`TrainingError`]. Callers that need
//! to pick a transport status or decide whether a failure is fatal use
//! [`TrainingError::kind`] instead of matching on individual variants.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Coarse classification of a [`TrainingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    ValidationError,
    PermissionDenied,
    ConfigurationError,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("Session '{0}' not found")]
    SessionNotFound(Uuid),
    #[error("Scenario '{scenario_id}' is not available for role '{role}'")]
    UnknownScenario { scenario_id: String, role: String },
    #[error("Session '{0}' is not active")]
    SessionNotActive(Uuid),
    #[error("User '{user_id}' already has an active session '{session_id}'; end it first")]
    SessionAlreadyActive { user_id: String, session_id: Uuid },
    #[error("Session '{0}' has already been recorded")]
    AlreadyRecorded(Uuid),
    #[error("No scenarios are registered for role '{0}'")]
    InvalidRole(String),
    #[error("Message text must not be empty")]
    EmptyMessage,
    #[error("Rating must be an integer between 1 and 5, got {0}")]
    InvalidRating(i64),
    #[error("A rating is required")]
    MissingRating,
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Turn did not complete: {0}")]
    TurnFailed(String),
}

impl TrainingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrainingError::SessionNotFound(_) | TrainingError::UnknownScenario { .. } => {
                ErrorKind::NotFound
            }
            TrainingError::SessionNotActive(_)
            | TrainingError::SessionAlreadyActive { .. }
            | TrainingError::AlreadyRecorded(_)
            | TrainingError::InvalidRole(_) => ErrorKind::InvalidState,
            TrainingError::EmptyMessage
            | TrainingError::InvalidRating(_)
            | TrainingError::MissingRating
            | TrainingError::InvalidUpload(_) => ErrorKind::ValidationError,
            TrainingError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            TrainingError::Configuration(_) => ErrorKind::ConfigurationError,
            TrainingError::Storage(_) | TrainingError::TurnFailed(_) => ErrorKind::Internal,
        }
    }
}

impl From<std::io::Error> for TrainingError {
    fn from(err: std::io::Error) -> Self {
        TrainingError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for TrainingError {
    fn from(err: serde_json::Error) -> Self {
        TrainingError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        let id = Uuid::new_v4();
        assert_eq!(TrainingError::SessionNotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(
            TrainingError::UnknownScenario {
                scenario_id: "x".into(),
                role: "AE".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(TrainingError::SessionNotActive(id).kind(), ErrorKind::InvalidState);
        assert_eq!(TrainingError::EmptyMessage.kind(), ErrorKind::ValidationError);
        assert_eq!(TrainingError::InvalidRating(0).kind(), ErrorKind::ValidationError);
        assert_eq!(
            TrainingError::PermissionDenied("owner only".into()).kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            TrainingError::Configuration("dup".into()).kind(),
            ErrorKind::ConfigurationError
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TrainingError::InvalidRating(7).to_string(),
            "Rating must be an integer between 1 and 5, got 7"
        );
        assert_eq!(ErrorKind::InvalidState.to_string(), "invalid_state");
        assert_eq!(
            serde_json::to_string(&ErrorKind::PermissionDenied).unwrap(),
            "\"permission_denied\""
        );
    }
}
