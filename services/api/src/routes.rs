//! API service routes

use axum::{
    Extension, Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    middleware::auth_middleware, models::AttributeKind, state::AppState, storage::MAX_IMAGE_SIZE,
};

pub mod attributes;
pub mod recipes;
pub mod user;

/// Room for multipart boundaries and headers around the image itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/user/me",
            get(user::me).put(user::replace_me).patch(user::update_me),
        )
        .merge(attribute_routes(AttributeKind::Tag))
        .merge(attribute_routes(AttributeKind::Ingredient))
        .route(
            "/recipe/recipes",
            get(recipes::list).post(recipes::create),
        )
        .route(
            "/recipe/recipes/:id",
            get(recipes::retrieve)
                .put(recipes::update)
                .patch(recipes::partial_update)
                .delete(recipes::destroy),
        )
        .route(
            "/recipe/recipes/:id/upload-image",
            post(recipes::upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + MULTIPART_OVERHEAD)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let media = ServeDir::new(state.media_storage.root());

    Router::new()
        .route("/health", get(health_check))
        .route("/user/create", post(user::create_user))
        .route("/user/token", post(user::create_token))
        .merge(protected_routes)
        .nest_service(state.media_storage.base_url(), media)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Collection and item routes for one attribute kind, e.g. `/recipe/tags`
fn attribute_routes(kind: AttributeKind) -> Router<AppState> {
    let collection = format!("/recipe/{}", kind.recipe_field());
    let item = format!("{}/:id", collection);

    Router::new()
        .route(
            &collection,
            get(attributes::list).post(attributes::create),
        )
        .route(
            &item,
            get(attributes::retrieve)
                .put(attributes::update)
                .patch(attributes::partial_update)
                .delete(attributes::destroy),
        )
        .layer(Extension(kind))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "recipe-api"
    }))
}
