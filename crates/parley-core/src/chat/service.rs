//! Chat service orchestrating session lifecycle and message persistence.
//!
//! `ChatService` coordinates the session store and the completion gateway
//! through one strictly ordered turn: find-or-create session, append the
//! user message, assemble the full context, obtain a reply, append the
//! assistant message. Each step awaits the previous one; there is no
//! parallelism within a turn.
//!
//! Concurrent turns on the *same* session are serialized by a per-session
//! advisory lock so their appends cannot interleave.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parley_types::chat::{ChatMessage, ChatSession, MessageRole, TurnOutcome};
use parley_types::config::GlobalConfig;
use parley_types::error::{RepositoryError, TurnError};
use parley_types::llm::CompletionRequest;
use parley_types::user::UserId;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::chat::assembler::{assemble, ContextPolicy};
use crate::chat::repository::ChatRepository;
use crate::chat::title::derive_title;
use crate::llm::gateway::CompletionGateway;

/// Per-turn completion parameters, extracted from [`GlobalConfig`].
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub policy: ContextPolicy,
}

impl TurnSettings {
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            policy: ContextPolicy::from_window(config.context_window),
        }
    }
}

/// Orchestrates chat turns over a session store and a completion gateway.
///
/// Generic over `ChatRepository` and `CompletionGateway` to maintain
/// clean architecture (parley-core never depends on parley-infra).
pub struct ChatService<C: ChatRepository, G: CompletionGateway> {
    repo: C,
    gateway: G,
    settings: TurnSettings,
    /// Advisory locks serializing concurrent turns per session.
    turn_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl<C: ChatRepository, G: CompletionGateway> ChatService<C, G> {
    /// Create a new chat service with the given store and gateway.
    pub fn new(repo: C, gateway: G, settings: TurnSettings) -> Self {
        Self {
            repo,
            gateway,
            settings,
            turn_locks: DashMap::new(),
        }
    }

    /// Access the session store.
    pub fn repo(&self) -> &C {
        &self.repo
    }

    /// Run one full turn: persist the user utterance, assemble the context,
    /// obtain a reply, persist it, and return the session id and reply.
    ///
    /// `session_id` absent creates a new session titled from `text`.
    /// A failure after the user message was persisted leaves it durably
    /// recorded -- the log shows an unanswered user turn, preserving the
    /// user's input for resubmission.
    #[tracing::instrument(name = "handle_turn", skip(self, text, directive), fields(user_id = %user_id))]
    pub async fn handle_turn(
        &self,
        user_id: UserId,
        session_id: Option<Uuid>,
        text: &str,
        directive: Option<&str>,
    ) -> Result<TurnOutcome, TurnError> {
        if text.trim().is_empty() {
            return Err(TurnError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }

        let sid = session_id.unwrap_or_else(Uuid::now_v7);

        // Clone the Arc out of the map entry before locking so the shard
        // guard is released first.
        let lock = self.turn_locks.entry(sid).or_default().clone();
        let guard = lock.lock().await;

        let result = self.run_turn(user_id, session_id, sid, text, directive).await;

        // Drop the guard and our clone, then evict the entry unless another
        // task already holds the Arc for this session. Without this the map
        // grows by one entry per distinct session id ever seen, including
        // ids that never existed.
        drop(guard);
        drop(lock);
        self.turn_locks
            .remove_if(&sid, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn run_turn(
        &self,
        user_id: UserId,
        session_id: Option<Uuid>,
        sid: Uuid,
        text: &str,
        directive: Option<&str>,
    ) -> Result<TurnOutcome, TurnError> {
        let now = Utc::now();
        let user_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: sid,
            role: MessageRole::User,
            content: text.to_string(),
            created_at: now,
        };

        if session_id.is_some() {
            // Continue an existing session; ownership is checked before any write.
            self.repo
                .find_session(&sid, &user_id)
                .await
                .map_err(store_failure)?
                .ok_or(TurnError::NotFound)?;

            self.repo
                .append_message(&user_message)
                .await
                .map_err(store_failure)?;
        } else {
            let session = ChatSession {
                id: sid,
                user_id,
                title: derive_title(text),
                created_at: now,
                updated_at: now,
            };
            self.repo
                .create_session_with_message(&session, &user_message)
                .await
                .map_err(store_failure)?;
            info!(session_id = %sid, "session created");
        }

        // Assembly happens strictly after the user-message write so the
        // assembled context reflects it.
        let history = self
            .repo
            .list_messages(&sid)
            .await
            .map_err(store_failure)?;
        let messages = assemble(directive, &history, self.settings.policy);

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.gateway.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
        );
        let response = self
            .gateway
            .complete(&request)
            .instrument(span)
            .await
            .map_err(|e| {
                error!(session_id = %sid, error = %e, "completion gateway failed mid-turn");
                TurnError::ProcessingFailed
            })?;

        let assistant_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: sid,
            role: MessageRole::Assistant,
            content: response.content.clone(),
            created_at: Utc::now(),
        };
        self.repo
            .append_message(&assistant_message)
            .await
            .map_err(store_failure)?;

        info!(
            session_id = %sid,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "turn completed"
        );

        Ok(TurnOutcome {
            session_id: sid,
            reply: response.content,
        })
    }

    /// Get a session by id, scoped to its owner.
    pub async fn get_session(
        &self,
        session_id: &Uuid,
        owner: &UserId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        self.repo.find_session(session_id, owner).await
    }

    /// List a user's sessions, most recently active first.
    pub async fn list_sessions(&self, owner: &UserId) -> Result<Vec<ChatSession>, RepositoryError> {
        self.repo.list_sessions(owner).await
    }

    /// Get a session's messages in creation order.
    pub async fn list_messages(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.repo.list_messages(session_id).await
    }

    /// Delete a session and all its messages; also drops its turn lock.
    pub async fn delete_session(
        &self,
        session_id: &Uuid,
        owner: &UserId,
    ) -> Result<(), RepositoryError> {
        self.repo.delete_session(session_id, owner).await?;
        self.turn_locks.remove(session_id);
        Ok(())
    }
}

/// Map a store failure to the caller-facing error, logging the detail.
fn store_failure(e: RepositoryError) -> TurnError {
    error!(error = %e, "session store failed mid-turn");
    TurnError::ProcessingFailed
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::{CompletionResponse, GatewayError, Usage};
    use std::sync::Mutex as StdMutex;

    /// In-memory session store for orchestrator tests.
    #[derive(Default)]
    struct MemoryRepo {
        sessions: StdMutex<Vec<ChatSession>>,
        messages: StdMutex<Vec<ChatMessage>>,
    }

    impl ChatRepository for MemoryRepo {
        async fn find_session(
            &self,
            session_id: &Uuid,
            owner: &UserId,
        ) -> Result<Option<ChatSession>, RepositoryError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == *session_id && s.user_id == *owner)
                .cloned())
        }

        async fn create_session_with_message(
            &self,
            session: &ChatSession,
            first_message: &ChatMessage,
        ) -> Result<(), RepositoryError> {
            self.sessions.lock().unwrap().push(session.clone());
            self.messages.lock().unwrap().push(first_message.clone());
            Ok(())
        }

        async fn list_sessions(&self, owner: &UserId) -> Result<Vec<ChatSession>, RepositoryError> {
            let mut sessions: Vec<ChatSession> = self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.user_id == *owner)
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(sessions)
        }

        async fn delete_session(
            &self,
            session_id: &Uuid,
            owner: &UserId,
        ) -> Result<(), RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|s| !(s.id == *session_id && s.user_id == *owner));
            if sessions.len() == before {
                return Err(RepositoryError::NotFound);
            }
            self.messages
                .lock()
                .unwrap()
                .retain(|m| m.session_id != *session_id);
            Ok(())
        }

        async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
            self.messages.lock().unwrap().push(message.clone());
            if let Some(s) = self
                .sessions
                .lock()
                .unwrap()
                .iter_mut()
                .find(|s| s.id == message.session_id)
            {
                s.updated_at = message.created_at;
            }
            Ok(())
        }

        async fn list_messages(
            &self,
            session_id: &Uuid,
        ) -> Result<Vec<ChatMessage>, RepositoryError> {
            let mut messages: Vec<ChatMessage> = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.session_id == *session_id)
                .cloned()
                .collect();
            messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(messages)
        }
    }

    /// Gateway that echoes a fixed reply and records the last request.
    struct EchoGateway {
        reply: String,
        last_request: StdMutex<Option<CompletionRequest>>,
    }

    impl EchoGateway {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last_request: StdMutex::new(None),
            }
        }
    }

    impl CompletionGateway for EchoGateway {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, GatewayError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: Usage::default(),
            })
        }
    }

    /// Gateway that always fails with an upstream error.
    struct DownGateway;

    impl CompletionGateway for DownGateway {
        fn name(&self) -> &str {
            "down"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, GatewayError> {
            Err(GatewayError::Unavailable("connection refused".to_string()))
        }
    }

    fn settings() -> TurnSettings {
        TurnSettings {
            model: "gpt-4".to_string(),
            max_tokens: 1024,
            temperature: None,
            policy: ContextPolicy::Full,
        }
    }

    fn service_with_echo(reply: &str) -> ChatService<MemoryRepo, EchoGateway> {
        ChatService::new(MemoryRepo::default(), EchoGateway::new(reply), settings())
    }

    #[tokio::test]
    async fn test_new_chat_creates_session_and_persists_both_messages() {
        let svc = service_with_echo("Hi! How can I help?");
        let user = UserId::new();

        let outcome = svc.handle_turn(user, None, "Hello", None).await.unwrap();
        assert!(!outcome.reply.is_empty());

        let session = svc
            .get_session(&outcome.session_id, &user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.title, "Hello");

        let messages = svc.list_messages(&outcome.session_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "Hi! How can I help?");
    }

    #[tokio::test]
    async fn test_long_first_message_truncates_title() {
        let svc = service_with_echo("ok");
        let user = UserId::new();
        let text = "y".repeat(60);

        let outcome = svc.handle_turn(user, None, &text, None).await.unwrap();
        let session = svc
            .get_session(&outcome.session_id, &user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.title, format!("{}...", "y".repeat(50)));
    }

    #[tokio::test]
    async fn test_gateway_receives_directive_plus_full_history() {
        let svc = service_with_echo("first reply");
        let user = UserId::new();

        let outcome = svc
            .handle_turn(user, None, "Hello", Some("Answer briefly."))
            .await
            .unwrap();
        svc.handle_turn(user, Some(outcome.session_id), "And again?", None)
            .await
            .unwrap();

        let request = svc.gateway.last_request.lock().unwrap().clone().unwrap();
        // [directive] ++ listMessages(session), user message already appended.
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(
            request.messages[0].content,
            crate::chat::assembler::DEFAULT_DIRECTIVE
        );
        assert_eq!(request.messages[1].content, "Hello");
        assert_eq!(request.messages[2].content, "first reply");
        assert_eq!(request.messages[3].content, "And again?");
    }

    #[tokio::test]
    async fn test_custom_directive_is_first() {
        let svc = service_with_echo("ok");
        let user = UserId::new();

        svc.handle_turn(user, None, "Hello", Some("Be terse."))
            .await
            .unwrap();

        let request = svc.gateway.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.messages[0].content, "Be terse.");
    }

    #[tokio::test]
    async fn test_foreign_session_is_not_found_and_appends_nothing() {
        let svc = service_with_echo("ok");
        let owner = UserId::new();
        let intruder = UserId::new();

        let outcome = svc.handle_turn(owner, None, "mine", None).await.unwrap();

        let err = svc
            .handle_turn(intruder, Some(outcome.session_id), "let me in", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::NotFound));

        // No messages were appended by the rejected turn.
        let messages = svc.list_messages(&outcome.session_id).await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_session_id_is_not_found() {
        let svc = service_with_echo("ok");
        let err = svc
            .handle_turn(UserId::new(), Some(Uuid::now_v7()), "hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::NotFound));
    }

    #[tokio::test]
    async fn test_gateway_failure_keeps_user_message_only() {
        let svc = ChatService::new(MemoryRepo::default(), DownGateway, settings());
        let user = UserId::new();

        let err = svc.handle_turn(user, None, "Hello", None).await.unwrap_err();
        assert!(matches!(err, TurnError::ProcessingFailed));

        // The user message stays durably recorded; no assistant reply exists.
        let sessions = svc.list_sessions(&user).await.unwrap();
        assert_eq!(sessions.len(), 1);
        let messages = svc.list_messages(&sessions[0].id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_empty_message_is_invalid_input() {
        let svc = service_with_echo("ok");
        let err = svc
            .handle_turn(UserId::new(), None, "   ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_turn_locks_do_not_accumulate_on_unknown_sessions() {
        let svc = service_with_echo("ok");
        let user = UserId::new();

        for _ in 0..100 {
            let err = svc
                .handle_turn(user, Some(Uuid::now_v7()), "hi", None)
                .await
                .unwrap_err();
            assert!(matches!(err, TurnError::NotFound));
        }

        assert!(svc.turn_locks.is_empty());
    }

    #[tokio::test]
    async fn test_turn_lock_evicted_after_completed_turn() {
        let svc = service_with_echo("ok");
        let user = UserId::new();

        let outcome = svc.handle_turn(user, None, "Hello", None).await.unwrap();

        assert!(!svc.turn_locks.contains_key(&outcome.session_id));
        // Eviction only drops the lock entry, not the session.
        assert!(svc
            .get_session(&outcome.session_id, &user)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_session_removes_messages_and_lock() {
        let svc = service_with_echo("ok");
        let user = UserId::new();

        let outcome = svc.handle_turn(user, None, "Hello", None).await.unwrap();
        svc.delete_session(&outcome.session_id, &user).await.unwrap();

        assert!(svc
            .get_session(&outcome.session_id, &user)
            .await
            .unwrap()
            .is_none());
        assert!(!svc.turn_locks.contains_key(&outcome.session_id));
    }

    #[tokio::test]
    async fn test_delete_foreign_session_is_not_found() {
        let svc = service_with_echo("ok");
        let owner = UserId::new();
        let outcome = svc.handle_turn(owner, None, "Hello", None).await.unwrap();

        let err = svc
            .delete_session(&outcome.session_id, &UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_most_recent_policy_bounds_resent_history() {
        let mut s = settings();
        s.policy = ContextPolicy::MostRecent(2);
        let svc = ChatService::new(MemoryRepo::default(), EchoGateway::new("ok"), s);
        let user = UserId::new();

        let outcome = svc.handle_turn(user, None, "one", None).await.unwrap();
        svc.handle_turn(user, Some(outcome.session_id), "two", None)
            .await
            .unwrap();

        let request = svc.gateway.last_request.lock().unwrap().clone().unwrap();
        // Directive plus only the last two persisted messages.
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[1].content, "ok");
        assert_eq!(request.messages[2].content, "two");
    }
}
