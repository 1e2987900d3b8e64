//! Session model - one record per active refresh-token lineage.
//!
//! Only the SHA-256 fingerprint of a refresh token is ever persisted; the
//! raw value exists in the issuing response and the client cookie.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

/// Refresh session entity.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub token_hash_text: String,
    pub expiry_utc: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
}

impl Session {
    /// Create a new session from an already-hashed token.
    pub fn new(user_id: Uuid, token_hash: String, expiry_days: i64) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            token_hash_text: token_hash,
            expiry_utc: Utc::now() + Duration::days(expiry_days),
            created_utc: Utc::now(),
        }
    }

    /// Generate a fresh opaque refresh token: 64 random bytes, hex-encoded.
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// SHA-256 fingerprint of a raw token, hex-encoded.
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_expired(&self) -> bool {
        self.expiry_utc <= Utc::now()
    }
}
