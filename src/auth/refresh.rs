/// Refresh token rotation
///
/// Both refresh surfaces (form field and cookie) hand their raw token to
/// `RefreshCoordinator::refresh`, so the throttle and verification rules
/// are the same wherever the token came from.
///
/// Rotation does not revoke the old refresh token. It stays valid until
/// its own expiry; concurrent refreshes with the same token each mint a
/// pair.

use crate::auth::issuer::{TokenIssuer, TokenPair};
use crate::auth::verifier::TokenVerifier;
use crate::configuration::JwtSettings;
use crate::error::{AppError, DatabaseError};
use crate::users::UserRepository;

#[derive(Clone)]
pub struct RefreshCoordinator {
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    /// Seconds before expiry from which rotation is allowed
    window: i64,
}

impl RefreshCoordinator {
    pub fn new(config: &JwtSettings) -> Self {
        Self::with_parts(
            TokenIssuer::new(config),
            TokenVerifier::new(config),
            config.refresh_window,
        )
    }

    pub fn with_parts(issuer: TokenIssuer, verifier: TokenVerifier, window: i64) -> Self {
        Self {
            issuer,
            verifier,
            window,
        }
    }

    /// Rotate a refresh token into a new pair
    ///
    /// # Errors
    /// - `InvalidRefreshToken`: verification failed (signature, expiry, issuer, shape)
    /// - `NotYetDue`: more than `window` seconds remain on the token
    /// - `MalformedInput`: subject is not a user id
    /// - `UnknownSubject`: no user with that id
    /// - `Signing`: the new pair could not be signed
    pub async fn refresh(
        &self,
        refresh_token: &str,
        users: &dyn UserRepository,
    ) -> Result<TokenPair, AppError> {
        let claims = self
            .verifier
            .verify_refresh(refresh_token)
            .map_err(AppError::InvalidRefreshToken)?;

        let remaining_secs = claims.remaining_secs();
        if remaining_secs > self.window {
            return Err(AppError::NotYetDue { remaining_secs });
        }

        let user_id: i32 = claims
            .sub
            .parse()
            .map_err(|_| AppError::MalformedInput(format!("invalid subject {:?}", claims.sub)))?;

        let identity = users.get_user(user_id).await.map_err(|e| match e {
            AppError::Database(DatabaseError::NotFound(_)) => {
                AppError::UnknownSubject(claims.sub.clone())
            }
            other => other,
        })?;

        self.issuer.issue(&identity)
    }
}
