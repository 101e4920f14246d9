//! Completion gateway abstraction.
//!
//! The external completion service is an opaque collaborator behind the
//! [`gateway::CompletionGateway`] trait; parley-infra provides the
//! OpenAI-compatible implementation.

pub mod gateway;
