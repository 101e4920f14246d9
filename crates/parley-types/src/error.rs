use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by the session orchestrator for a single turn.
///
/// Everything the caller is allowed to see. Store and completion-service
/// failures collapse into `ProcessingFailed`; the detail is logged for
/// operators only.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("chat session not found")]
    NotFound,

    #[error("failed to process chat message")]
    ProcessingFailed,
}

/// Errors related to user and API key operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("email '{0}' already registered")]
    EmailConflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_turn_error_is_generic() {
        // ProcessingFailed must not leak internal detail.
        assert_eq!(
            TurnError::ProcessingFailed.to_string(),
            "failed to process chat message"
        );
    }

    #[test]
    fn test_user_error_display() {
        let err = UserError::EmailConflict("a@b.c".to_string());
        assert_eq!(err.to_string(), "email 'a@b.c' already registered");
    }
}
