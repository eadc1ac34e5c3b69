/// Password Hashing and Verification
///
/// The stored hash format is bcrypt. Verification only answers "does this
/// secret match this identity"; the caller decides how to report a miss.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;
use crate::users::Identity;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a submitted password against the identity's stored hash
///
/// An unreadable stored hash counts as a mismatch.
pub fn verify_password(identity: &Identity, password: &str) -> bool {
    if password.is_empty() {
        return false;
    }
    verify(password, &identity.password_hash).unwrap_or(false)
}
