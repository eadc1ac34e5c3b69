/// Token verification
///
/// Checks structure, signing method, signature, expiry and issuer of a
/// presented token. Verification is a pure function of the token, the
/// shared secret, the configured domain and the current time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::auth::claims::{AccessClaims, RefreshClaims, TokenClaims};
use crate::configuration::JwtSettings;
use crate::error::TokenError;

const ACCEPTED_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// The only header field read before the signature is checked
#[derive(Deserialize)]
struct DeclaredAlgorithm {
    alg: String,
}

/// Read `alg` from the raw header as a plain string
///
/// `jsonwebtoken` cannot deserialize algorithm names it does not know
/// (`none`, `XYZ`), so those would otherwise surface as malformed tokens.
fn check_declared_algorithm(token: &str) -> Result<(), TokenError> {
    let header = token.split('.').next().unwrap_or_default();
    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let declared: DeclaredAlgorithm =
        serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;

    if ACCEPTED_ALGORITHMS.contains(&declared.alg.as_str()) {
        Ok(())
    } else {
        Err(TokenError::UnexpectedAlgorithm)
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    domain: String,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Any HMAC variant is accepted, nothing else
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        // Issuer and audience are compared below so their failures stay distinguishable
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            domain: config.domain.clone(),
            validation,
        }
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify(token)
    }

    /// Validate a token and extract its claims
    ///
    /// # Errors
    /// - `Malformed`: not a JWT, or the payload is not a `C`
    /// - `UnexpectedAlgorithm`: header algorithm outside HS256/HS384/HS512
    /// - `InvalidSignature`: signed with a different secret or tampered with
    /// - `Expired`: `exp` is in the past
    /// - `WrongIssuer` / `WrongAudience`: not issued for the configured domain
    pub fn verify<C: TokenClaims>(&self, token: &str) -> Result<C, TokenError> {
        check_declared_algorithm(token)?;

        let claims = decode::<C>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidAlgorithm => TokenError::UnexpectedAlgorithm,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if claims.issuer() != self.domain {
            return Err(TokenError::WrongIssuer);
        }

        if let Some(aud) = claims.audience() {
            if aud != self.domain {
                return Err(TokenError::WrongAudience);
            }
        }

        Ok(claims)
    }
}
