/// Authentication module
///
/// Token issuance and verification, refresh rotation, refresh cookies and
/// password checks.

mod claims;
mod cookie;
mod issuer;
mod password;
mod refresh;
mod verifier;

pub use claims::{AccessClaims, RefreshClaims, TokenClaims};
pub use cookie::{expired_refresh_cookie, refresh_cookie};
pub use issuer::{TokenIssuer, TokenPair};
pub use password::{hash_password, verify_password};
pub use refresh::RefreshCoordinator;
pub use verifier::TokenVerifier;
