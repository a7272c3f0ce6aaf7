//! PostgreSQL repository for tags and ingredients

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::{
    error::ApiResult,
    models::{Attribute, AttributeKind},
    repositories::AttributeRepository,
};

/// Attribute repository bound to one table
#[derive(Clone)]
pub struct PgAttributeRepository {
    pool: PgPool,
    kind: AttributeKind,
}

impl PgAttributeRepository {
    pub fn new(pool: PgPool, kind: AttributeKind) -> Self {
        Self { pool, kind }
    }
}

#[async_trait]
impl AttributeRepository for PgAttributeRepository {
    async fn list(&self, owner: i64) -> ApiResult<Vec<Attribute>> {
        let rows = sqlx::query_as::<_, Attribute>(&format!(
            "SELECT id, user_id, name FROM {} WHERE user_id = $1",
            self.kind.table()
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find(&self, owner: i64, id: i64) -> ApiResult<Option<Attribute>> {
        let row = sqlx::query_as::<_, Attribute>(&format!(
            "SELECT id, user_id, name FROM {} WHERE user_id = $1 AND id = $2",
            self.kind.table()
        ))
        .bind(owner)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_many(&self, owner: i64, ids: &[i64]) -> ApiResult<Vec<Attribute>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, Attribute>(&format!(
            "SELECT id, user_id, name FROM {} WHERE user_id = $1 AND id = ANY($2) ORDER BY id",
            self.kind.table()
        ))
        .bind(owner)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create(&self, owner: i64, name: &str) -> ApiResult<Attribute> {
        let row = sqlx::query_as::<_, Attribute>(&format!(
            "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
            self.kind.table()
        ))
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        info!("Created {} {} for user {}", self.kind.label(), row.id, owner);
        Ok(row)
    }

    async fn rename(&self, owner: i64, id: i64, name: &str) -> ApiResult<Option<Attribute>> {
        let row = sqlx::query_as::<_, Attribute>(&format!(
            r#"
            UPDATE {} SET name = $3
            WHERE user_id = $1 AND id = $2
            RETURNING id, user_id, name
            "#,
            self.kind.table()
        ))
        .bind(owner)
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, owner: i64, id: i64) -> ApiResult<bool> {
        // join rows go with it through ON DELETE CASCADE
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND id = $2",
            self.kind.table()
        ))
        .bind(owner)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Deleted {} {} for user {}", self.kind.label(), id, owner);
        }
        Ok(result.rows_affected() > 0)
    }
}
