//! Infrastructure layer for Parley.
//!
//! Contains implementations of the traits defined in `parley-core`:
//! SQLite storage for sessions, messages, users, and API keys, plus the
//! OpenAI-compatible completion gateway and the config loader.

pub mod config;
pub mod llm;
pub mod sqlite;
