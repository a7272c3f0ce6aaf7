//! Recipe model, its write payload and its two read representations
//!
//! Lists and writes answer with the compact form (related rows as ids); a
//! single-recipe read answers with the detail form (related rows nested).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiResult, FieldErrors},
    models::attribute::{Attribute, AttributeResponse},
    storage::MediaStorage,
    validation::{
        PRICE_DECIMAL_PLACES, validate_optional_text, validate_price, validate_required_text,
        validate_time_minutes,
    },
};

/// Recipe row together with its related ids
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    /// Storage path of the uploaded image, relative to the media root
    pub image: Option<String>,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// Validated values for creating or fully replacing a recipe
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeWrite {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// Recipe payload as sent by clients. Every field is optional here so that
/// missing values surface as field errors instead of a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

impl RecipeRequest {
    /// Full write (create or PUT): required fields must be present, absent
    /// relations become empty.
    pub fn into_write(self) -> ApiResult<RecipeWrite> {
        let mut errors = FieldErrors::new();
        if self.title.is_none() {
            errors.add("title", "This field is required");
        }
        if self.time_minutes.is_none() {
            errors.add("time_minutes", "This field is required");
        }
        if self.price.is_none() {
            errors.add("price", "This field is required");
        }
        errors.into_result()?;

        let write = RecipeWrite {
            title: self.title.unwrap_or_default(),
            time_minutes: self.time_minutes.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            tag_ids: self.tags.unwrap_or_default(),
            ingredient_ids: self.ingredients.unwrap_or_default(),
        };
        write.validated()
    }

    /// Partial write (PATCH): supplied fields replace the stored ones
    pub fn merge_into(self, existing: &Recipe) -> ApiResult<RecipeWrite> {
        let write = RecipeWrite {
            title: self.title.unwrap_or_else(|| existing.title.clone()),
            time_minutes: self.time_minutes.unwrap_or(existing.time_minutes),
            price: self.price.unwrap_or(existing.price),
            link: self.link.unwrap_or_else(|| existing.link.clone()),
            tag_ids: self.tags.unwrap_or_else(|| existing.tag_ids.clone()),
            ingredient_ids: self
                .ingredients
                .unwrap_or_else(|| existing.ingredient_ids.clone()),
        };
        write.validated()
    }
}

impl RecipeWrite {
    fn validated(mut self) -> ApiResult<Self> {
        let mut errors = FieldErrors::new();
        errors.check("title", validate_required_text(&self.title, "Title"));
        errors.check("time_minutes", validate_time_minutes(self.time_minutes));
        errors.check("price", validate_price(&self.price));
        errors.check("link", validate_optional_text(&self.link, "Link"));
        errors.into_result()?;

        self.title = self.title.trim().to_string();
        self.link = self.link.trim().to_string();
        self.price = self.price.round_dp(PRICE_DECIMAL_PLACES);
        self.tag_ids.sort_unstable();
        self.tag_ids.dedup();
        self.ingredient_ids.sort_unstable();
        self.ingredient_ids.dedup();
        Ok(self)
    }
}

/// Render a price the way it is stored: two decimal places
fn format_price(price: Decimal) -> String {
    let mut price = price;
    price.rescale(PRICE_DECIMAL_PLACES);
    price.to_string()
}

/// Compact representation: related rows as id lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub image: Option<String>,
}

impl RecipeResponse {
    pub fn new(recipe: &Recipe, storage: &MediaStorage) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            ingredients: recipe.ingredient_ids.clone(),
            tags: recipe.tag_ids.clone(),
            time_minutes: recipe.time_minutes,
            price: format_price(recipe.price),
            link: recipe.link.clone(),
            image: recipe.image.as_deref().map(|path| storage.url(path)),
        }
    }
}

/// Detail representation: related rows nested as `{id, name}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetailResponse {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<AttributeResponse>,
    pub tags: Vec<AttributeResponse>,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub image: Option<String>,
}

impl RecipeDetailResponse {
    /// `tags` and `ingredients` are the rows behind the recipe's id lists;
    /// they are emitted in id order.
    pub fn new(
        recipe: &Recipe,
        tags: &[Attribute],
        ingredients: &[Attribute],
        storage: &MediaStorage,
    ) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            ingredients: nested(ingredients),
            tags: nested(tags),
            time_minutes: recipe.time_minutes,
            price: format_price(recipe.price),
            link: recipe.link.clone(),
            image: recipe.image.as_deref().map(|path| storage.url(path)),
        }
    }
}

fn nested(attributes: &[Attribute]) -> Vec<AttributeResponse> {
    let mut nested: Vec<AttributeResponse> = attributes.iter().map(Into::into).collect();
    nested.sort_by_key(|a| a.id);
    nested
}

/// Response of the image upload action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

impl RecipeImageResponse {
    pub fn new(recipe: &Recipe, storage: &MediaStorage) -> Self {
        Self {
            id: recipe.id,
            image: recipe.image.as_deref().map(|path| storage.url(path)),
        }
    }
}

/// Sort the way list endpoints return recipes: newest first
pub fn sort_for_listing(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| b.id.cmp(&a.id));
}
