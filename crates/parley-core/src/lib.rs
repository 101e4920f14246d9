//! Business logic for Parley.
//!
//! Defines the traits the infrastructure layer implements (`ChatRepository`,
//! `CompletionGateway`) and the session orchestrator that coordinates them.
//! This crate never depends on parley-infra.

pub mod chat;
pub mod llm;
