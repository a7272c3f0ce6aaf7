//! PostgreSQL recipe repository

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::info;

use crate::{
    error::ApiResult,
    filters::RecipeFilter,
    models::{AttributeKind, Recipe, RecipeWrite},
    repositories::RecipeRepository,
};

const RECIPE_COLUMNS: &str = "id, user_id, title, time_minutes, price, link, image";

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: i64,
    user_id: i64,
    title: String,
    time_minutes: i32,
    price: Decimal,
    link: String,
    image: Option<String>,
}

impl RecipeRow {
    fn into_recipe(self, links: &mut Links) -> Recipe {
        Recipe {
            tag_ids: links.tags.remove(&self.id).unwrap_or_default(),
            ingredient_ids: links.ingredients.remove(&self.id).unwrap_or_default(),
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            image: self.image,
        }
    }
}

/// Related ids per recipe, ascending
#[derive(Default)]
struct Links {
    tags: HashMap<i64, Vec<i64>>,
    ingredients: HashMap<i64, Vec<i64>>,
}

/// Recipe repository
#[derive(Clone)]
pub struct PgRecipeRepository {
    pool: PgPool,
}

impl PgRecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_links(&self, recipe_ids: &[i64]) -> Result<Links, sqlx::Error> {
        let mut links = Links::default();
        if recipe_ids.is_empty() {
            return Ok(links);
        }

        for kind in [AttributeKind::Tag, AttributeKind::Ingredient] {
            let pairs: Vec<(i64, i64)> = sqlx::query_as(&format!(
                "SELECT recipe_id, {col} FROM {join} WHERE recipe_id = ANY($1) ORDER BY recipe_id, {col}",
                col = kind.join_column(),
                join = kind.join_table(),
            ))
            .bind(recipe_ids)
            .fetch_all(&self.pool)
            .await?;

            let map = match kind {
                AttributeKind::Tag => &mut links.tags,
                AttributeKind::Ingredient => &mut links.ingredients,
            };
            for (recipe_id, attribute_id) in pairs {
                map.entry(recipe_id).or_default().push(attribute_id);
            }
        }

        Ok(links)
    }

    async fn with_links(&self, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, sqlx::Error> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut links = self.load_links(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_recipe(&mut links))
            .collect())
    }
}

/// Replace the links of one kind. Only ids owned by `owner` are linked.
async fn replace_links(
    conn: &mut PgConnection,
    kind: AttributeKind,
    owner: i64,
    recipe_id: i64,
    ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE recipe_id = $1",
        kind.join_table()
    ))
    .bind(recipe_id)
    .execute(&mut *conn)
    .await?;

    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query(&format!(
        r#"
        INSERT INTO {join} (recipe_id, {col})
        SELECT $1, id FROM {table} WHERE user_id = $2 AND id = ANY($3)
        "#,
        join = kind.join_table(),
        col = kind.join_column(),
        table = kind.table(),
    ))
    .bind(recipe_id)
    .bind(owner)
    .bind(ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Add `AND EXISTS (...)` for one filter dimension
fn push_any_of(builder: &mut QueryBuilder<'_, Postgres>, kind: AttributeKind, ids: &[i64]) {
    builder.push(format!(
        " AND EXISTS (SELECT 1 FROM {join} WHERE {join}.recipe_id = recipes.id AND {join}.{col} = ANY(",
        join = kind.join_table(),
        col = kind.join_column(),
    ));
    builder.push_bind(ids.to_vec());
    builder.push("))");
}

#[async_trait]
impl RecipeRepository for PgRecipeRepository {
    async fn list(&self, owner: i64, filter: &RecipeFilter) -> ApiResult<Vec<Recipe>> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = "
        ));
        builder.push_bind(owner);

        if let Some(tags) = &filter.tags {
            push_any_of(&mut builder, AttributeKind::Tag, tags);
        }
        if let Some(ingredients) = &filter.ingredients {
            push_any_of(&mut builder, AttributeKind::Ingredient, ingredients);
        }

        let rows = builder
            .build_query_as::<RecipeRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(self.with_links(rows).await?)
    }

    async fn find(&self, owner: i64, id: i64) -> ApiResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = $1 AND id = $2"
        ))
        .bind(owner)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_links(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, owner: i64, write: &RecipeWrite) -> ApiResult<Recipe> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(owner)
        .bind(&write.title)
        .bind(write.time_minutes)
        .bind(write.price)
        .bind(&write.link)
        .fetch_one(&mut *tx)
        .await?;

        replace_links(&mut tx, AttributeKind::Tag, owner, id, &write.tag_ids).await?;
        replace_links(&mut tx, AttributeKind::Ingredient, owner, id, &write.ingredient_ids).await?;
        tx.commit().await?;

        info!("Created recipe {} for user {}", id, owner);
        self.find(owner, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Recipe {} vanished after insert", id).into())
    }

    async fn update(&self, owner: i64, id: i64, write: &RecipeWrite) -> ApiResult<Option<Recipe>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE recipes
            SET title = $3, time_minutes = $4, price = $5, link = $6
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(owner)
        .bind(id)
        .bind(&write.title)
        .bind(write.time_minutes)
        .bind(write.price)
        .bind(&write.link)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        replace_links(&mut tx, AttributeKind::Tag, owner, id, &write.tag_ids).await?;
        replace_links(&mut tx, AttributeKind::Ingredient, owner, id, &write.ingredient_ids).await?;
        tx.commit().await?;

        self.find(owner, id).await
    }

    async fn set_image(&self, owner: i64, id: i64, image: &str) -> ApiResult<Option<Recipe>> {
        let updated = sqlx::query("UPDATE recipes SET image = $3 WHERE user_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .bind(image)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(owner, id).await
    }

    async fn delete(&self, owner: i64, id: i64) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE user_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!("Deleted recipe {} for user {}", id, owner);
        }
        Ok(result.rows_affected() > 0)
    }
}
