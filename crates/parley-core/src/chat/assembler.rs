//! Message assembler: reconstructs the ordered context for a completion call.
//!
//! The assembled sequence is always `[directive] ++ history` -- one system
//! entry first, then every persisted message of the session in ascending
//! creation order mapped to `{role, content}`. The persisted message log is
//! the sole source of conversational context; no cache or token window is
//! consulted beyond the explicit [`ContextPolicy`].

use parley_types::chat::ChatMessage;
use parley_types::llm::{Message, MessageRole};

/// Directive used when the caller supplies none.
pub const DEFAULT_DIRECTIVE: &str = "You are a helpful AI assistant.";

/// How much of the persisted history is resent per turn.
///
/// `Full` replays everything (the observed default); `MostRecent(n)` bounds
/// request size as history grows, keeping only the last `n` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPolicy {
    Full,
    MostRecent(usize),
}

impl Default for ContextPolicy {
    fn default() -> Self {
        ContextPolicy::Full
    }
}

impl ContextPolicy {
    /// Build a policy from the optional `context_window` config value.
    pub fn from_window(window: Option<usize>) -> Self {
        match window {
            Some(n) => ContextPolicy::MostRecent(n),
            None => ContextPolicy::Full,
        }
    }
}

/// Assemble the ordered message sequence for the completion service.
///
/// `history` must already be in ascending creation order (the repository
/// contract) and must include the just-persisted user message.
pub fn assemble(
    directive: Option<&str>,
    history: &[ChatMessage],
    policy: ContextPolicy,
) -> Vec<Message> {
    let window = match policy {
        ContextPolicy::Full => history,
        ContextPolicy::MostRecent(n) => {
            let skip = history.len().saturating_sub(n);
            &history[skip..]
        }
    };

    let mut messages = Vec::with_capacity(window.len() + 1);
    messages.push(Message {
        role: MessageRole::System,
        content: directive.unwrap_or(DEFAULT_DIRECTIVE).to_string(),
    });
    messages.extend(window.iter().map(|m| Message {
        role: m.role,
        content: m.content.clone(),
    }));

    messages
}
