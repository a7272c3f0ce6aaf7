//! Shared fixtures for the HTTP tests: in-memory repositories behind the
//! real router, and helpers for users, tokens and sample rows.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderValue, header::HeaderName};
use axum_test::TestServer;
use chrono::Utc;
use rust_decimal::Decimal;
use tempfile::TempDir;

use recipe_api::{
    error::{ApiError, ApiResult},
    filters::RecipeFilter,
    jwt::{JwtConfig, JwtService},
    models::{Attribute, AttributeKind, NewUser, Recipe, RecipeWrite, UpdateUser, User},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{AttributeRepository, DUPLICATE_EMAIL, RecipeRepository, UserRepository},
    routes::create_router,
    state::AppState,
    storage::MediaStorage,
};

pub const TEST_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "testpass123";

#[derive(Default)]
struct Store {
    next_id: i64,
    users: Vec<User>,
    tags: Vec<Attribute>,
    ingredients: Vec<Attribute>,
    recipes: Vec<Recipe>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn attributes(&mut self, kind: AttributeKind) -> &mut Vec<Attribute> {
        match kind {
            AttributeKind::Tag => &mut self.tags,
            AttributeKind::Ingredient => &mut self.ingredients,
        }
    }

    /// Keep only ids naming rows of `owner`, as the join inserts do
    fn owned_ids(&mut self, kind: AttributeKind, owner: i64, ids: &[i64]) -> Vec<i64> {
        let rows = self.attributes(kind);
        ids.iter()
            .copied()
            .filter(|id| rows.iter().any(|row| row.id == *id && row.user_id == owner))
            .collect()
    }
}

/// One store shared by every repository, like tables in one database
#[derive(Clone, Default)]
pub struct MemoryStore(Arc<Mutex<Store>>);

pub struct MemoryUsers(MemoryStore);

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create(&self, new_user: &NewUser) -> ApiResult<User> {
        let mut store = self.0.0.lock().unwrap();
        if store.users.iter().any(|u| u.email == new_user.email) {
            return Err(ApiError::field("email", DUPLICATE_EMAIL));
        }

        let now = Utc::now();
        let user = User {
            id: store.next_id(),
            email: new_user.email.clone(),
            name: new_user.name.clone(),
            password_hash: new_user.password_hash.clone(),
            is_active: true,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let store = self.0.0.lock().unwrap();
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> ApiResult<Option<User>> {
        let store = self.0.0.lock().unwrap();
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update(&self, id: i64, changes: &UpdateUser) -> ApiResult<User> {
        let mut store = self.0.0.lock().unwrap();
        if let Some(email) = &changes.email {
            if store.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(ApiError::field("email", DUPLICATE_EMAIL));
            }
        }

        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ApiError::NotFound)?;
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(hash) = &changes.password_hash {
            user.password_hash = hash.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

pub struct MemoryAttributes {
    store: MemoryStore,
    kind: AttributeKind,
}

#[async_trait]
impl AttributeRepository for MemoryAttributes {
    async fn list(&self, owner: i64) -> ApiResult<Vec<Attribute>> {
        let mut store = self.store.0.lock().unwrap();
        Ok(store
            .attributes(self.kind)
            .iter()
            .filter(|row| row.user_id == owner)
            .cloned()
            .collect())
    }

    async fn find(&self, owner: i64, id: i64) -> ApiResult<Option<Attribute>> {
        let mut store = self.store.0.lock().unwrap();
        Ok(store
            .attributes(self.kind)
            .iter()
            .find(|row| row.user_id == owner && row.id == id)
            .cloned())
    }

    async fn find_many(&self, owner: i64, ids: &[i64]) -> ApiResult<Vec<Attribute>> {
        let mut store = self.store.0.lock().unwrap();
        let mut rows: Vec<Attribute> = store
            .attributes(self.kind)
            .iter()
            .filter(|row| row.user_id == owner && ids.contains(&row.id))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn create(&self, owner: i64, name: &str) -> ApiResult<Attribute> {
        let mut store = self.store.0.lock().unwrap();
        let row = Attribute {
            id: store.next_id(),
            user_id: owner,
            name: name.to_string(),
        };
        store.attributes(self.kind).push(row.clone());
        Ok(row)
    }

    async fn rename(&self, owner: i64, id: i64, name: &str) -> ApiResult<Option<Attribute>> {
        let mut store = self.store.0.lock().unwrap();
        let row = store
            .attributes(self.kind)
            .iter_mut()
            .find(|row| row.user_id == owner && row.id == id);
        Ok(row.map(|row| {
            row.name = name.to_string();
            row.clone()
        }))
    }

    async fn delete(&self, owner: i64, id: i64) -> ApiResult<bool> {
        let mut store = self.store.0.lock().unwrap();
        let rows = store.attributes(self.kind);
        let before = rows.len();
        rows.retain(|row| !(row.user_id == owner && row.id == id));
        let deleted = rows.len() < before;

        if deleted {
            for recipe in store.recipes.iter_mut() {
                match self.kind {
                    AttributeKind::Tag => recipe.tag_ids.retain(|t| *t != id),
                    AttributeKind::Ingredient => recipe.ingredient_ids.retain(|i| *i != id),
                }
            }
        }
        Ok(deleted)
    }
}

pub struct MemoryRecipes(MemoryStore);

#[async_trait]
impl RecipeRepository for MemoryRecipes {
    async fn list(&self, owner: i64, filter: &RecipeFilter) -> ApiResult<Vec<Recipe>> {
        let store = self.0.0.lock().unwrap();
        Ok(store
            .recipes
            .iter()
            .filter(|r| r.user_id == owner && filter.matches(&r.tag_ids, &r.ingredient_ids))
            .cloned()
            .collect())
    }

    async fn find(&self, owner: i64, id: i64) -> ApiResult<Option<Recipe>> {
        let store = self.0.0.lock().unwrap();
        Ok(store
            .recipes
            .iter()
            .find(|r| r.user_id == owner && r.id == id)
            .cloned())
    }

    async fn create(&self, owner: i64, write: &RecipeWrite) -> ApiResult<Recipe> {
        let mut store = self.0.0.lock().unwrap();
        let recipe = Recipe {
            id: store.next_id(),
            user_id: owner,
            title: write.title.clone(),
            time_minutes: write.time_minutes,
            price: write.price,
            link: write.link.clone(),
            image: None,
            tag_ids: store.owned_ids(AttributeKind::Tag, owner, &write.tag_ids),
            ingredient_ids: store.owned_ids(AttributeKind::Ingredient, owner, &write.ingredient_ids),
        };
        store.recipes.push(recipe.clone());
        Ok(recipe)
    }

    async fn update(&self, owner: i64, id: i64, write: &RecipeWrite) -> ApiResult<Option<Recipe>> {
        let mut store = self.0.0.lock().unwrap();
        let tag_ids = store.owned_ids(AttributeKind::Tag, owner, &write.tag_ids);
        let ingredient_ids = store.owned_ids(AttributeKind::Ingredient, owner, &write.ingredient_ids);

        let recipe = store
            .recipes
            .iter_mut()
            .find(|r| r.user_id == owner && r.id == id);
        Ok(recipe.map(|recipe| {
            recipe.title = write.title.clone();
            recipe.time_minutes = write.time_minutes;
            recipe.price = write.price;
            recipe.link = write.link.clone();
            recipe.tag_ids = tag_ids;
            recipe.ingredient_ids = ingredient_ids;
            recipe.clone()
        }))
    }

    async fn set_image(&self, owner: i64, id: i64, image: &str) -> ApiResult<Option<Recipe>> {
        let mut store = self.0.0.lock().unwrap();
        let recipe = store
            .recipes
            .iter_mut()
            .find(|r| r.user_id == owner && r.id == id);
        Ok(recipe.map(|recipe| {
            recipe.image = Some(image.to_string());
            recipe.clone()
        }))
    }

    async fn delete(&self, owner: i64, id: i64) -> ApiResult<bool> {
        let mut store = self.0.0.lock().unwrap();
        let before = store.recipes.len();
        store.recipes.retain(|r| !(r.user_id == owner && r.id == id));
        Ok(store.recipes.len() < before)
    }
}

/// The router wired to in-memory repositories and a temporary media root
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limiter(RateLimiterConfig::default())
    }

    pub fn with_rate_limiter(config: RateLimiterConfig) -> Self {
        let media = tempfile::tempdir().unwrap();
        let store = MemoryStore::default();

        let state = AppState {
            user_repository: Arc::new(MemoryUsers(store.clone())),
            tag_repository: Arc::new(MemoryAttributes {
                store: store.clone(),
                kind: AttributeKind::Tag,
            }),
            ingredient_repository: Arc::new(MemoryAttributes {
                store: store.clone(),
                kind: AttributeKind::Ingredient,
            }),
            recipe_repository: Arc::new(MemoryRecipes(store)),
            jwt_service: JwtService::new(JwtConfig {
                secret: TEST_SECRET.to_string(),
                token_expiry: 3600,
            })
            .unwrap(),
            rate_limiter: RateLimiter::new(config),
            media_storage: MediaStorage::new(media.path(), "/media"),
        };

        let server = TestServer::new(create_router(state.clone())).unwrap();
        Self {
            server,
            state,
            media,
        }
    }

    pub fn media_root(&self) -> &std::path::Path {
        self.media.path()
    }

    /// Store a user directly, bypassing the signup endpoint
    pub async fn create_user(&self, email: &str, password: &str) -> User {
        let new_user = NewUser::create_user(email, password, "Test User").unwrap();
        self.state.user_repository.create(&new_user).await.unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.jwt_service.issue_token(user).unwrap()
    }

    /// A stored user and a valid `Authorization` header value for them
    pub async fn login(&self, email: &str) -> (User, HeaderValue) {
        let user = self.create_user(email, PASSWORD).await;
        let header = bearer(&self.token_for(&user));
        (user, header)
    }

    pub async fn sample_attribute(&self, kind: AttributeKind, owner: &User, name: &str) -> Attribute {
        self.state
            .attributes(kind)
            .create(owner.id, name)
            .await
            .unwrap()
    }

    pub async fn sample_tag(&self, owner: &User, name: &str) -> Attribute {
        self.sample_attribute(AttributeKind::Tag, owner, name).await
    }

    pub async fn sample_ingredient(&self, owner: &User, name: &str) -> Attribute {
        self.sample_attribute(AttributeKind::Ingredient, owner, name).await
    }

    pub async fn sample_recipe(&self, owner: &User, title: &str) -> Recipe {
        self.sample_recipe_with(owner, title, vec![], vec![]).await
    }

    pub async fn sample_recipe_with(
        &self,
        owner: &User,
        title: &str,
        tag_ids: Vec<i64>,
        ingredient_ids: Vec<i64>,
    ) -> Recipe {
        let write = RecipeWrite {
            title: title.to_string(),
            time_minutes: 10,
            price: Decimal::from_str("5.00").unwrap(),
            link: String::new(),
            tag_ids,
            ingredient_ids,
        };
        self.state
            .recipe_repository
            .create(owner.id, &write)
            .await
            .unwrap()
    }
}

pub fn authorization() -> HeaderName {
    axum::http::header::AUTHORIZATION
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}
