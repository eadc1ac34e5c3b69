/// Token issuance
///
/// Mints the signed access/refresh pair handed to a client after login or
/// rotation.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::AppError;
use crate::users::Identity;

/// Access and refresh token, always issued together
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    domain: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl TokenIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            key: EncodingKey::from_secret(config.secret.as_bytes()),
            domain: config.domain.clone(),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
        }
    }

    /// Issue a fresh pair for an authenticated identity
    ///
    /// # Errors
    /// Returns `AppError::Signing` if either token cannot be signed; no
    /// partial pair is ever returned.
    pub fn issue(&self, identity: &Identity) -> Result<TokenPair, AppError> {
        let access_claims = AccessClaims::new(identity, &self.domain, self.access_token_expiry);
        let access_token = self.sign(&access_claims)?;

        let refresh_claims = RefreshClaims::new(identity, &self.domain, self.refresh_token_expiry);
        let refresh_token = self.sign(&refresh_claims)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub(crate) fn sign<C: Serialize>(&self, claims: &C) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key)
            .map_err(|e| AppError::Signing(e.to_string()))
    }
}
