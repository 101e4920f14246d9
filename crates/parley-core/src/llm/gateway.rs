//! CompletionGateway trait definition.
//!
//! One atomic request/response against the external completion service:
//! no streaming, no retries, no caching. Uses native async fn in traits
//! (RPITIT, Rust 2024 edition).

use parley_types::llm::{CompletionRequest, CompletionResponse, GatewayError};

/// Trait for completion-service backends.
///
/// Implementations live in parley-infra (e.g., `OpenAiCompatibleGateway`).
pub trait CompletionGateway: Send + Sync {
    /// Human-readable gateway name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send the assembled message sequence and receive the full reply.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, GatewayError>> + Send;
}
