//! Repositories for database operations
//!
//! Handlers only see the traits, so the HTTP layer can be driven by any
//! store. Every attribute and recipe method is scoped to an owner: rows of
//! other users behave exactly like rows that do not exist.

use async_trait::async_trait;

use crate::{
    error::ApiResult,
    filters::RecipeFilter,
    models::{Attribute, NewUser, Recipe, RecipeWrite, UpdateUser, User},
};

pub mod attribute;
pub mod recipe;
pub mod user;

pub use attribute::PgAttributeRepository;
pub use recipe::PgRecipeRepository;
pub use user::PgUserRepository;

/// Message stored under `email` when an address is already registered
pub const DUPLICATE_EMAIL: &str = "user with this email already exists.";

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a taken email is a validation error keyed `email`
    async fn create(&self, new_user: &NewUser) -> ApiResult<User>;

    /// Look up by normalized email
    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> ApiResult<Option<User>>;

    /// Apply the supplied column changes and return the stored row
    async fn update(&self, id: i64, changes: &UpdateUser) -> ApiResult<User>;
}

/// Store for one attribute kind (tags or ingredients)
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    /// All rows of `owner`, unordered
    async fn list(&self, owner: i64) -> ApiResult<Vec<Attribute>>;

    async fn find(&self, owner: i64, id: i64) -> ApiResult<Option<Attribute>>;

    /// The subset of `ids` that exists and belongs to `owner`
    async fn find_many(&self, owner: i64, ids: &[i64]) -> ApiResult<Vec<Attribute>>;

    async fn create(&self, owner: i64, name: &str) -> ApiResult<Attribute>;

    /// `None` when the row is missing or not owned
    async fn rename(&self, owner: i64, id: i64, name: &str) -> ApiResult<Option<Attribute>>;

    /// Remove the row and its recipe links; `false` when nothing was deleted
    async fn delete(&self, owner: i64, id: i64) -> ApiResult<bool>;
}

#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Recipes of `owner` passing `filter`, unordered.
    ///
    /// Implementations select exactly the recipes [`RecipeFilter::matches`] accepts.
    async fn list(&self, owner: i64, filter: &RecipeFilter) -> ApiResult<Vec<Recipe>>;

    async fn find(&self, owner: i64, id: i64) -> ApiResult<Option<Recipe>>;

    /// Insert a recipe. Related ids must already be checked against `owner`.
    async fn create(&self, owner: i64, write: &RecipeWrite) -> ApiResult<Recipe>;

    /// Replace every writable field and both relation sets
    async fn update(&self, owner: i64, id: i64, write: &RecipeWrite) -> ApiResult<Option<Recipe>>;

    /// Point the recipe at a stored image path
    async fn set_image(&self, owner: i64, id: i64, image: &str) -> ApiResult<Option<Recipe>>;

    async fn delete(&self, owner: i64, id: i64) -> ApiResult<bool>;
}
