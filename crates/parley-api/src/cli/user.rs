//! CLI user provisioning.
//!
//! `parley create-user --email <email>` registers a user and generates
//! their API key. The plaintext key is printed once; only its SHA-256
//! hash is stored.

use anyhow::{bail, Result};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::error::UserError;
use parley_types::user::{ApiKey, User, UserId};

use crate::http::extractors::auth::hash_api_key;

/// Generate a fresh API key: `parley_` followed by 64 hex chars.
pub fn generate_api_key() -> String {
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    format!(
        "parley_{}",
        key_bytes
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>()
    )
}

/// Create a user and their first API key, printing the key once.
pub async fn create_user(repo: &SqliteUserRepository, email: &str) -> Result<()> {
    if email.trim().is_empty() || !email.contains('@') {
        bail!("'{email}' is not a valid email address");
    }

    let user = User {
        id: UserId::new(),
        email: email.trim().to_string(),
        created_at: Utc::now(),
    };

    match repo.create_user(&user).await {
        Ok(()) => {}
        Err(UserError::EmailConflict(email)) => {
            bail!("a user with email '{email}' already exists");
        }
        Err(e) => return Err(e.into()),
    }

    let plaintext_key = generate_api_key();
    let key = ApiKey {
        id: Uuid::now_v7(),
        user_id: user.id,
        key_hash: hash_api_key(&plaintext_key),
        name: "default".to_string(),
        created_at: Utc::now(),
        last_used_at: None,
    };
    repo.insert_api_key(&key).await?;

    println!();
    println!(
        "  {} User {} created",
        console::style("✓").green(),
        console::style(&user.email).cyan()
    );
    println!();
    println!(
        "  {} API key generated (save this -- it won't be shown again):",
        console::style("🔑").bold()
    );
    println!();
    println!("  {}", console::style(&plaintext_key).yellow().bold());
    println!();

    Ok(())
}
