//! API key authentication extractor.
//!
//! Extracts and verifies API keys from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//!
//! Keys are SHA-256 hashed and compared against the `api_keys` table.
//! The extractor resolves the key to the owning [`UserId`]; handlers scope
//! every session operation by it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use parley_types::user::UserId;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request identity. Extracting this validates the API key
/// and yields the owning user's id.
pub struct Authenticated(pub UserId);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(parts)?;
        let key_hash = hash_api_key(&api_key);

        let resolved = state
            .user_repo
            .find_user_by_key_hash(&key_hash)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

        match resolved {
            Some((key_id, user_id)) => {
                // Update last_used_at (best effort, don't fail the request)
                let _ = state.user_repo.touch_api_key(&key_id).await;
                Ok(Authenticated(user_id))
            }
            None => Err(AppError::Unauthorized(
                "Invalid API key. Provide a valid key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
            )),
        }
    }
}

/// Extract the API key from request headers.
fn extract_api_key(parts: &Parts) -> Result<String, AppError> {
    // Try Authorization: Bearer <key>
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(key.trim().to_string());
        }
    }

    // Try X-API-Key header
    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing API key. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
    ))
}

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(name: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_extracts_bearer_token() {
        let parts = parts_with_header("authorization", "Bearer parley_abc123");
        assert_eq!(extract_api_key(&parts).unwrap(), "parley_abc123");
    }

    #[test]
    fn test_extracts_x_api_key_header() {
        let parts = parts_with_header("x-api-key", "parley_abc123");
        assert_eq!(extract_api_key(&parts).unwrap(), "parley_abc123");
    }

    #[test]
    fn test_trims_whitespace_around_key() {
        let parts = parts_with_header("x-api-key", "  parley_abc123  ");
        assert_eq!(extract_api_key(&parts).unwrap(), "parley_abc123");
    }

    #[test]
    fn test_missing_key_is_unauthorized() {
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert!(matches!(
            extract_api_key(&parts),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_hash_is_lowercase_hex_sha256() {
        let hash = hash_api_key("parley_test");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        // Stable for the same input
        assert_eq!(hash, hash_api_key("parley_test"));
    }
}
