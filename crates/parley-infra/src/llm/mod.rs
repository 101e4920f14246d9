//! Completion gateway implementations.
//!
//! Contains the concrete implementation of the [`CompletionGateway`] trait
//! defined in `parley-core`: an OpenAI-compatible client that also serves
//! any endpoint speaking the same chat-completions protocol via a
//! configurable base URL.
//!
//! [`CompletionGateway`]: parley_core::llm::gateway::CompletionGateway

pub mod openai_compat;
