/// JWT Claims structures
///
/// Access and refresh tokens carry different payloads. Refresh claims only
/// re-authenticate the subject, so they never hold display or privilege
/// data, and they reject unknown fields: an access token cannot be replayed
/// as a refresh token.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::users::Identity;

/// Claims common to every token kind, read by the verifier
pub trait TokenClaims: DeserializeOwned {
    fn issuer(&self) -> &str;
    /// Audience to check against the configured domain, if this kind carries one
    fn audience(&self) -> Option<&str> {
        None
    }
}

/// Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (user id as a string)
    pub sub: String,
    /// Display name, "<first> <last>"
    pub name: String,
    pub aud: String,
    pub iss: String,
    pub admin: bool,
    /// Unique token id, so two tokens minted in the same second differ
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(identity: &Identity, domain: &str, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: identity.id.to_string(),
            name: identity.display_name(),
            aud: domain.to_string(),
            iss: domain.to_string(),
            admin: identity.is_admin == 1,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + expiry_seconds,
        }
    }
}

impl TokenClaims for AccessClaims {
    fn issuer(&self) -> &str {
        &self.iss
    }

    fn audience(&self) -> Option<&str> {
        Some(&self.aud)
    }
}

/// Claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub sub: String,
    pub iss: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn new(identity: &Identity, domain: &str, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: identity.id.to_string(),
            iss: domain.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + expiry_seconds,
        }
    }

    /// Seconds left before this token expires, negative once it has
    pub fn remaining_secs(&self) -> i64 {
        self.exp - chrono::Utc::now().timestamp()
    }
}

impl TokenClaims for RefreshClaims {
    fn issuer(&self) -> &str {
        &self.iss
    }
}
