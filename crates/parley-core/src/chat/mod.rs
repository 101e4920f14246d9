//! Chat session orchestration for Parley.
//!
//! `repository` defines the session-store trait the infrastructure layer
//! implements; `assembler` builds the ordered context sent to the completion
//! service; `service` is the orchestrator tying them together.

pub mod assembler;
pub mod repository;
pub mod service;
pub mod title;
