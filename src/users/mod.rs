/// User records
///
/// Users are owned by an external store. This service only reads them to
/// check credentials at login and to resolve the subject of a refresh token.

mod memory;
mod postgres;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppError;

pub use memory::InMemoryUserRepository;
pub use postgres::PostgresUserRepository;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// 1 for administrators
    pub is_admin: i32,
}

impl Identity {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Lookup capability the auth handlers depend on
///
/// A missing user is reported as `AppError::Database(DatabaseError::NotFound)`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: i32) -> Result<Identity, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Identity, AppError>;
}
