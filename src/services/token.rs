//! Signed ticket tokens carried in QR codes.
//!
//! Wire format: `v1.<ticket_code>.<sig>` where `sig` is the first 16 hex
//! characters (8 bytes) of `HMAC-SHA256(secret, ticket_code)`. The truncation
//! keeps QR payloads small and must not change, or tickets already printed
//! stop verifying.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_VERSION: &str = "v1";
/// Hex characters of the HMAC kept in the token.
pub const SIGNATURE_HEX_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not in v1.<code>.<signature> form")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("ticket code cannot be encoded in a token")]
    UnencodableCode,

    #[error("signing secret is empty")]
    EmptySecret,
}

/// Signs and verifies ticket tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("secret", &"<redacted>").finish()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        // HMAC accepts keys of any length; the only failure is our empty check.
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::EmptySecret)?;
        Ok(Self { mac })
    }

    /// Full hex HMAC-SHA256 of the ticket code.
    pub fn sign(&self, ticket_code: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(ticket_code.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Builds the token printed into a ticket's QR code.
    pub fn issue(&self, ticket_code: &str) -> Result<String, TokenError> {
        if ticket_code.is_empty() || ticket_code.contains('.') {
            return Err(TokenError::UnencodableCode);
        }
        let signature = self.sign(ticket_code);
        Ok(format!(
            "{TOKEN_VERSION}.{ticket_code}.{}",
            &signature[..SIGNATURE_HEX_LEN]
        ))
    }

    /// Checks a scanned token and returns the ticket code it carries.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        let [version, ticket_code, signature] = segments.as_slice() else {
            return Err(TokenError::Malformed);
        };
        if *version != TOKEN_VERSION || ticket_code.is_empty() {
            return Err(TokenError::Malformed);
        }

        let expected = self.sign(ticket_code);
        let expected = &expected[..SIGNATURE_HEX_LEN];
        if !constant_time_eq::constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(TokenError::BadSignature);
        }

        Ok((*ticket_code).to_string())
    }
}
