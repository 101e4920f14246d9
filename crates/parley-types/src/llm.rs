//! Completion request/response types for Parley.
//!
//! These types model the data shapes exchanged with the external completion
//! service: the message roles, the assembled request, and the reply.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in a conversation.
///
/// A closed set: any other value is rejected at the store boundary
/// (both by `FromStr` and the SQL CHECK constraint on `chat_messages.role`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single `{role, content}` entry in an assembled conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Request to the completion service.
///
/// `messages` is the fully assembled sequence: the per-request directive as
/// a leading `system` entry, then the session history in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from the completion service for a single atomic request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

/// Token usage reported by the completion service.
///
/// Logged for operators; not part of the persisted data model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from completion gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport failure or non-success response from the completion service.
    #[error("completion service unavailable: {0}")]
    Unavailable(String),

    /// The service answered but the payload could not be interpreted.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),

    #[error("completion service authentication failed")]
    AuthenticationFailed,
}
