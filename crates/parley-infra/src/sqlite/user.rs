//! SQLite user and API key storage.
//!
//! The identity provider surface: users are registered through the CLI, and
//! requests are resolved to a `UserId` by looking up the SHA-256 hash of the
//! presented API key. No trait in parley-core backs this -- identity is an
//! external collaborator from the orchestrator's point of view.

use chrono::{DateTime, Utc};
use parley_types::error::UserError;
use parley_types::user::{ApiKey, User, UserId};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed user and API key store.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Register a new user. Duplicate emails map to `EmailConflict`.
    pub async fn create_user(&self, user: &User) -> Result<(), UserError> {
        let result = sqlx::query("INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.email)
            .bind(format_datetime(&user.created_at))
            .execute(&self.pool.writer)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(UserError::EmailConflict(user.email.clone()))
            }
            Err(e) => Err(UserError::StorageError(e.to_string())),
        }
    }

    /// Look up a user by email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    /// Store a new API key record (hash only; the plaintext never lands here).
    pub async fn insert_api_key(&self, key: &ApiKey) -> Result<(), UserError> {
        sqlx::query(
            r#"INSERT INTO api_keys (id, user_id, key_hash, name, created_at, last_used_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(key.id.to_string())
        .bind(key.user_id.to_string())
        .bind(&key.key_hash)
        .bind(&key.name)
        .bind(format_datetime(&key.created_at))
        .bind(key.last_used_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| UserError::StorageError(e.to_string()))?;

        Ok(())
    }

    /// Resolve an API key hash to the owning user, or `None` when unknown.
    ///
    /// Returns the key record id as well so the caller can touch
    /// `last_used_at`.
    pub async fn find_user_by_key_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<(Uuid, UserId)>, UserError> {
        let row = sqlx::query("SELECT id, user_id FROM api_keys WHERE key_hash = ?")
            .bind(key_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?;

        match row {
            Some(row) => {
                let id: String = row
                    .try_get("id")
                    .map_err(|e| UserError::StorageError(e.to_string()))?;
                let user_id: String = row
                    .try_get("user_id")
                    .map_err(|e| UserError::StorageError(e.to_string()))?;
                let key_id = Uuid::parse_str(&id)
                    .map_err(|e| UserError::StorageError(format!("invalid key id: {e}")))?;
                let user_id = Uuid::parse_str(&user_id)
                    .map_err(|e| UserError::StorageError(format!("invalid user_id: {e}")))?;
                Ok(Some((key_id, UserId(user_id))))
            }
            None => Ok(None),
        }
    }

    /// Update `last_used_at` on a key. Best effort; callers may ignore errors.
    pub async fn touch_api_key(&self, key_id: &Uuid) -> Result<(), UserError> {
        sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(key_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?;
        Ok(())
    }
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, UserError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| UserError::StorageError(format!("invalid datetime: {e}")))
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, UserError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| UserError::StorageError(e.to_string()))?;
    let email: String = row
        .try_get("email")
        .map_err(|e| UserError::StorageError(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| UserError::StorageError(e.to_string()))?;

    Ok(User {
        id: UserId(
            Uuid::parse_str(&id)
                .map_err(|e| UserError::StorageError(format!("invalid user id: {e}")))?,
        ),
        email,
        created_at: parse_datetime(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_user(email: &str) -> User {
        User {
            id: UserId::new(),
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }

    fn make_key(user_id: UserId, hash: &str) -> ApiKey {
        ApiKey {
            id: Uuid::now_v7(),
            user_id,
            key_hash: hash.to_string(),
            name: "default".to_string(),
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = make_user("alice@example.com");

        repo.create_user(&user).await.unwrap();

        let found = repo
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create_user(&make_user("alice@example.com"))
            .await
            .unwrap();

        let err = repo
            .create_user(&make_user("alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::EmailConflict(_)));
    }

    #[tokio::test]
    async fn test_key_hash_resolves_to_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = make_user("alice@example.com");
        repo.create_user(&user).await.unwrap();

        let key = make_key(user.id, "abc123");
        repo.insert_api_key(&key).await.unwrap();

        let (key_id, user_id) = repo
            .find_user_by_key_hash("abc123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(key_id, key.id);
        assert_eq!(user_id, user.id);

        assert!(repo
            .find_user_by_key_hash("wrong")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_touch_api_key() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = make_user("alice@example.com");
        repo.create_user(&user).await.unwrap();
        let key = make_key(user.id, "abc123");
        repo.insert_api_key(&key).await.unwrap();

        repo.touch_api_key(&key.id).await.unwrap();
    }
}
