use async_trait::async_trait;

use crate::error::{AppError, DatabaseError};
use crate::users::{Identity, UserRepository};

/// Fixed set of users held in memory, for tests and local runs
///
/// Lookups behave like `PostgresUserRepository`: email must match exactly.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Vec<Identity>,
}

impl InMemoryUserRepository {
    pub fn new(users: Vec<Identity>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user(&self, id: i32) -> Result<Identity, AppError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)).into())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Identity, AppError> {
        self.users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()).into())
    }
}
