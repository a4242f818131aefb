//! List synchronization error types
//!
//! Typed errors so screens can tell a retryable network failure from a
//! rejected double tap or a bad configuration.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    // ==========================================================================
    // Configuration
    // ==========================================================================
    InvalidConfig { field: &'static str, reason: String },
    Settings(String),

    // ==========================================================================
    // Mutations
    // ==========================================================================
    MutationInProgress { entity: String },
    EntityNotFound { entity: String },
    NotAuthenticated,
    MutationFailed { entity: String, message: String },
    MutationAbandoned { entity: String },

    // ==========================================================================
    // Loading
    // ==========================================================================
    LoadInProgress,
    LoadFailed(String),
}

impl SyncError {
    /// Whether showing a retry affordance makes sense
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MutationFailed { .. } | Self::MutationAbandoned { .. } | Self::LoadFailed(_)
        )
    }

    pub(crate) fn mutation_failed(entity: impl fmt::Display, error: anyhow::Error) -> Self {
        Self::MutationFailed {
            entity: entity.to_string(),
            message: format!("{:#}", error),
        }
    }

    pub(crate) fn load_failed(error: anyhow::Error) -> Self {
        Self::LoadFailed(format!("{:#}", error))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { field, reason } => {
                write!(f, "Invalid list setting `{}`: {}", field, reason)
            }
            Self::Settings(msg) => write!(f, "Failed to read list settings: {}", msg),
            Self::MutationInProgress { entity } => {
                write!(f, "A change to {} is already in progress", entity)
            }
            Self::EntityNotFound { entity } => write!(f, "{} is not in this list", entity),
            Self::NotAuthenticated => write!(f, "You need to be logged in to do that"),
            Self::MutationFailed { entity, message } => {
                write!(f, "Failed to update {}: {}", entity, message)
            }
            Self::MutationAbandoned { entity } => {
                write!(f, "Update to {} was abandoned before the server answered", entity)
            }
            Self::LoadInProgress => write!(f, "Already loading"),
            Self::LoadFailed(msg) => write!(f, "Failed to load more: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Settings(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::LoadFailed("timeout".into()).is_retryable());
        assert!(SyncError::mutation_failed(1, anyhow::anyhow!("500")).is_retryable());
        assert!(!SyncError::MutationInProgress { entity: "1".into() }.is_retryable());
        assert!(!SyncError::NotAuthenticated.is_retryable());
    }

    #[test]
    fn test_display_keeps_cause_chain() {
        let err = anyhow::anyhow!("connection reset").context("POST /communities/4/join");
        let sync = SyncError::mutation_failed(4, err);
        assert_eq!(
            sync.to_string(),
            "Failed to update 4: POST /communities/4/join: connection reset"
        );
    }
}
