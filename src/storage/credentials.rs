// src/storage/credentials.rs
use crate::storage::StorageError;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Salted HMAC-SHA256 of a password. Only the salt and digest are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub salt: String,
    pub password_hash: String,
}

impl Credentials {
    pub fn derive(password: &str) -> Result<Self, StorageError> {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = keyed(&salt)?
            .chain_update(password.as_bytes())
            .finalize()
            .into_bytes();
        let password_hash = hex::encode(digest);
        Ok(Self {
            salt,
            password_hash,
        })
    }

    /// Constant-time comparison against the stored digest.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(expected) = hex::decode(&self.password_hash) else {
            return false;
        };
        match keyed(&self.salt) {
            Ok(mac) => mac
                .chain_update(password.as_bytes())
                .verify_slice(&expected)
                .is_ok(),
            Err(_) => false,
        }
    }
}

fn keyed(salt: &str) -> Result<HmacSha256, StorageError> {
    HmacSha256::new_from_slice(salt.as_bytes()).map_err(|_| StorageError::InvalidCredentials)
}
