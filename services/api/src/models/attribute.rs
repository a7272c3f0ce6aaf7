//! Recipe attributes: the tags and ingredients a user files recipes under
//!
//! Both kinds share one shape (an owned, named row) and one set of routes;
//! `AttributeKind` picks the table and the wording.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    error::{ApiError, ApiResult},
    validation::validate_required_text,
};

/// Which attribute table a row lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    /// Table holding rows of this kind
    pub fn table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    /// Join table linking recipes to rows of this kind
    pub fn join_table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "recipe_tags",
            AttributeKind::Ingredient => "recipe_ingredients",
        }
    }

    /// Foreign key column in the join table
    pub fn join_column(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_id",
            AttributeKind::Ingredient => "ingredient_id",
        }
    }

    /// Field name used for this kind in recipe payloads and filters
    pub fn recipe_field(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag",
            AttributeKind::Ingredient => "ingredient",
        }
    }
}

/// Tag or ingredient row
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Attribute {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// Create/update payload; `name` is the only writable field
#[derive(Debug, Default, Deserialize)]
pub struct AttributeRequest {
    pub name: Option<String>,
}

impl AttributeRequest {
    /// The trimmed name, or a validation error keyed `name`
    pub fn into_name(self) -> ApiResult<String> {
        let name = self.name.unwrap_or_default();
        validate_required_text(&name, "Name").map_err(|msg| ApiError::field("name", msg))?;
        Ok(name.trim().to_string())
    }
}

/// `{id, name}` representation, also nested inside recipe details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeResponse {
    pub id: i64,
    pub name: String,
}

impl From<&Attribute> for AttributeResponse {
    fn from(attribute: &Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name.clone(),
        }
    }
}

/// Sort the way list endpoints return attributes: name descending, newest first on ties
pub fn sort_for_listing(attributes: &mut [Attribute]) {
    attributes.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));
}
