// src/storage/mod.rs
pub mod credentials;
pub mod json_store;

use crate::core::portfolio::Portfolio;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credentials::Credentials;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

pub use json_store::JsonAccountStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Account store {path} is corrupt: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("The user '{0}' already exists")]
    UserExists(String),
    #[error("The user '{0}' does not exist")]
    UnknownUser(String),
    #[error("Wrong user id or password")]
    InvalidCredentials,
    #[error("Invalid user id '{0}': use 1-64 characters without spaces")]
    InvalidUserId(String),
}

/// One user's persisted account: login material plus the full portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub user_id: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub portfolio: Portfolio,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Record for `user_id`, if present.
    async fn find(&self, user_id: &str) -> Result<Option<AccountRecord>, StorageError>;

    /// Insert or replace the record with the same `user_id`.
    async fn save(&self, record: &AccountRecord) -> Result<(), StorageError>;
}

pub fn validate_user_id(user_id: &str) -> Result<String, StorageError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() || trimmed.len() > 64 || trimmed.chars().any(char::is_whitespace) {
        return Err(StorageError::InvalidUserId(user_id.to_string()));
    }
    Ok(trimmed.to_string())
}

pub async fn register<S: AccountStore + ?Sized>(
    store: &S,
    user_id: &str,
    password: &str,
    portfolio: Portfolio,
) -> Result<AccountRecord, StorageError> {
    let user_id = validate_user_id(user_id)?;
    if store.find(&user_id).await?.is_some() {
        return Err(StorageError::UserExists(user_id));
    }

    let now = Utc::now();
    let record = AccountRecord {
        user_id,
        credentials: Credentials::derive(password)?,
        created_at: now,
        updated_at: now,
        portfolio,
    };
    store.save(&record).await?;
    info!("Registered account {}", record.user_id);
    Ok(record)
}

pub async fn authenticate<S: AccountStore + ?Sized>(
    store: &S,
    user_id: &str,
    password: &str,
) -> Result<AccountRecord, StorageError> {
    let user_id = validate_user_id(user_id)?;
    let record = store
        .find(&user_id)
        .await?
        .ok_or_else(|| StorageError::UnknownUser(user_id.clone()))?;

    if !record.credentials.verify(password) {
        warn!("Failed login for {}", user_id);
        return Err(StorageError::InvalidCredentials);
    }
    info!("User {} logged in", user_id);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn store() -> (tempfile::TempDir, JsonAccountStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAccountStore::new(dir.path().join("accounts.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let (_dir, store) = store();
        let portfolio = Portfolio::open(Decimal::from(500)).unwrap();
        let created = register(&store, " alice ", "s3cret", portfolio.clone())
            .await
            .unwrap();
        assert_eq!(created.user_id, "alice");

        let logged_in = authenticate(&store, "alice", "s3cret").await.unwrap();
        assert_eq!(logged_in, created);
        assert_eq!(logged_in.portfolio, portfolio);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (_dir, store) = store();
        let p = Portfolio::open(Decimal::from(1)).unwrap();
        register(&store, "bob", "a", p.clone()).await.unwrap();
        assert!(matches!(
            register(&store, "bob", "b", p).await,
            Err(StorageError::UserExists(_))
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user() {
        let (_dir, store) = store();
        let p = Portfolio::open(Decimal::from(1)).unwrap();
        register(&store, "carol", "right", p).await.unwrap();

        assert!(matches!(
            authenticate(&store, "carol", "wrong").await,
            Err(StorageError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, "dave", "right").await,
            Err(StorageError::UnknownUser(_))
        ));
    }

    #[test]
    fn user_id_rules() {
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("two words").is_err());
        assert!(validate_user_id(&"x".repeat(65)).is_err());
        assert_eq!(validate_user_id(" eve ").unwrap(), "eve");
    }
}
