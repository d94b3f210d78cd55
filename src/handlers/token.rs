use crate::handlers::auth::Payload;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, OsRng, Payload as AeadPayload};
use aes_gcm::{AeadCore, Aes256Gcm, KeyInit};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use thiserror::Error;

/// Required length of the symmetric key, in bytes.
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// Version/purpose prefix of every token. Bound into the AEAD as associated
/// data, so a token re-labelled under another prefix fails to open.
const TOKEN_HEADER: &str = "v1.local.";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid key size: must be exactly {SYMMETRIC_KEY_LEN} bytes, got {0}")]
    KeyLength(usize),
    #[error("token is malformed")]
    Malformed,
    #[error("token failed authentication")]
    Tampered,
    #[error("token has expired")]
    Expired,
    #[error("token duration must be positive, got {0}")]
    Duration(chrono::Duration),
    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// Authenticated symmetric encryption of session payloads.
///
/// Wire form is `v1.local.` followed by the unpadded base64url encoding of
/// `nonce || ciphertext || tag`. The plaintext is the JSON payload, so nothing
/// about the subject is visible without the key.
#[derive(Clone)]
pub struct TokenCodec {
    cipher: Aes256Gcm,
}

impl Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(key: &[u8]) -> Result<Self, TokenError> {
        if key.len() != SYMMETRIC_KEY_LEN {
            return Err(TokenError::KeyLength(key.len()));
        }
        Ok(Self {
            cipher: Aes256Gcm::new(GenericArray::from_slice(key)),
        })
    }

    /// Seals a payload. Every call draws a fresh nonce, so the same payload
    /// never yields the same token twice.
    pub fn encrypt(&self, payload: &Payload) -> Result<String, TokenError> {
        let plaintext =
            serde_json::to_vec(payload).map_err(|e| TokenError::Encode(e.to_string()))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(
                &nonce,
                AeadPayload {
                    msg: &plaintext,
                    aad: TOKEN_HEADER.as_bytes(),
                },
            )
            .map_err(|_| TokenError::Encode("cipher rejected payload".to_string()))?;

        let body = [nonce.as_slice(), sealed.as_slice()].concat();
        Ok(format!("{}{}", TOKEN_HEADER, URL_SAFE_NO_PAD.encode(body)))
    }

    pub fn decrypt(&self, token: &str) -> Result<Payload, TokenError> {
        self.decrypt_at(token, Utc::now())
    }

    /// Opens a token and checks expiry against `now`.
    ///
    /// Integrity is verified before the payload is looked at, and expiry only
    /// after that, so an expired token is never confused with a forged one.
    pub fn decrypt_at(&self, token: &str, now: DateTime<Utc>) -> Result<Payload, TokenError> {
        let encoded = token
            .strip_prefix(TOKEN_HEADER)
            .ok_or(TokenError::Malformed)?;
        let body = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Malformed)?;
        if body.len() < NONCE_LEN + TAG_LEN {
            return Err(TokenError::Malformed);
        }

        let (nonce, sealed) = body.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                GenericArray::from_slice(nonce),
                AeadPayload {
                    msg: sealed,
                    aad: TOKEN_HEADER.as_bytes(),
                },
            )
            .map_err(|_| TokenError::Tampered)?;

        let payload: Payload =
            serde_json::from_slice(&plaintext).map_err(|_| TokenError::Malformed)?;
        payload.valid_at(now)?;
        Ok(payload)
    }
}
