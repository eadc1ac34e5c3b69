use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, DatabaseError};
use crate::users::{Identity, UserRepository};

type UserRow = (i32, String, String, String, String, i32);

/// Reads users from the `users` table
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_identity(row: UserRow) -> Identity {
    let (id, first_name, last_name, email, password_hash, is_admin) = row;
    Identity {
        id,
        first_name,
        last_name,
        email,
        password_hash,
        is_admin,
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_user(&self, id: i32) -> Result<Identity, AppError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, email, password, is_admin
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(into_identity)
        .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)).into())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Identity, AppError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, email, password, is_admin
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(into_identity)
        .ok_or_else(|| DatabaseError::NotFound("user".to_string()).into())
    }
}
