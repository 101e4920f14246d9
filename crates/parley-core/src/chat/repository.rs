//! ChatRepository trait definition.
//!
//! Session and message persistence operations, all scoped by owner identity:
//! a session is only ever looked up or deleted by the (id, owner) pair, never
//! by id alone. Message operations take a bare session id because the
//! orchestrator verifies ownership before calling them.

use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::RepositoryError;
use parley_types::user::UserId;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Get a session by id, scoped to its owner.
    ///
    /// Returns `None` both when the session does not exist and when it is
    /// owned by a different identity -- the two cases are indistinguishable
    /// to callers.
    fn find_session(
        &self,
        session_id: &Uuid,
        owner: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Create a session together with its first user message, atomically.
    ///
    /// Either both records are durable or neither is; a turn can never leave
    /// an empty session behind.
    fn create_session_with_message(
        &self,
        session: &ChatSession,
        first_message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List a user's sessions, ordered by `updated_at` DESC
    /// (most recently active first).
    fn list_sessions(
        &self,
        owner: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Delete a session owned by `owner`, cascading to all its messages.
    ///
    /// Returns `RepositoryError::NotFound` when the session is absent or
    /// owned by someone else.
    fn delete_session(
        &self,
        session_id: &Uuid,
        owner: &UserId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a message to a session and bump the session's `updated_at`,
    /// atomically. Callers must have verified ownership first.
    fn append_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get all messages of a session, ordered by `created_at` ASC.
    fn list_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
