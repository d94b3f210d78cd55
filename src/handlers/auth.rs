use crate::handlers::token::{TokenCodec, TokenError};
use crate::models::all_models::UserRole;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Claims sealed inside a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Payload {
    /// Unique per issuance; the key a revocation list would use.
    pub token_id: Uuid,
    pub user_id: i64,
    /// Name at login time, not re-checked against the store.
    pub username: String,
    pub role: UserRole,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Payload {
    /// Fails unless `duration` is strictly positive, so every payload has
    /// `expires_at > issued_at`.
    pub fn new(
        user_id: i64,
        username: String,
        role: UserRole,
        issued_at: DateTime<Utc>,
        duration: Duration,
    ) -> Result<Self, TokenError> {
        if duration <= Duration::zero() {
            return Err(TokenError::Duration(duration));
        }
        Ok(Payload {
            token_id: Uuid::new_v4(),
            user_id,
            username,
            role,
            issued_at,
            expires_at: issued_at + duration,
        })
    }

    pub fn valid_at(&self, now: DateTime<Utc>) -> Result<(), TokenError> {
        if now > self.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

/// Mints session tokens at login.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    codec: Arc<TokenCodec>,
}

impl SessionIssuer {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        SessionIssuer { codec }
    }

    /// Returns the wire token together with the payload sealed inside it.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
        duration: Duration,
    ) -> Result<(String, Payload), TokenError> {
        let payload = Payload::new(user_id, username.to_string(), role, Utc::now(), duration)?;
        let token = self.codec.encrypt(&payload)?;
        Ok((token, payload))
    }
}
