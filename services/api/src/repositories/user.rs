//! PostgreSQL user repository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{NewUser, UpdateUser, User},
    repositories::{DUPLICATE_EMAIL, UserRepository},
};

const USER_COLUMNS: &str =
    "id, email, name, password_hash, is_active, is_staff, is_superuser, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique violations on `users.email` to a field error
fn email_conflict(e: sqlx::Error) -> ApiError {
    let duplicate = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if duplicate {
        ApiError::field("email", DUPLICATE_EMAIL)
    } else {
        e.into()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> ApiResult<User> {
        info!("Creating new user: {}", new_user.email);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.is_staff)
        .bind(new_user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(email_conflict)?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, id: i64, changes: &UpdateUser) -> ApiResult<User> {
        info!("Updating user {}", id);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                name = COALESCE($3, name),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email.as_deref())
        .bind(changes.name.as_deref())
        .bind(changes.password_hash.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(email_conflict)?;

        user.ok_or(ApiError::NotFound)
    }
}
