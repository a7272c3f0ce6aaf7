//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    jwt::JwtService,
    models::AttributeKind,
    rate_limiter::RateLimiter,
    repositories::{AttributeRepository, RecipeRepository, UserRepository},
    storage::MediaStorage,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub tag_repository: Arc<dyn AttributeRepository>,
    pub ingredient_repository: Arc<dyn AttributeRepository>,
    pub recipe_repository: Arc<dyn RecipeRepository>,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
    pub media_storage: MediaStorage,
}

impl AppState {
    /// Repository holding rows of `kind`
    pub fn attributes(&self, kind: AttributeKind) -> &Arc<dyn AttributeRepository> {
        match kind {
            AttributeKind::Tag => &self.tag_repository,
            AttributeKind::Ingredient => &self.ingredient_repository,
        }
    }
}
