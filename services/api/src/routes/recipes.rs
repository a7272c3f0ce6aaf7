//! Recipe handlers

use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult, FieldErrors},
    filters::RecipeQuery,
    middleware::{AuthUser, JsonBody},
    models::{
        AttributeKind, Recipe, RecipeDetailResponse, RecipeImageResponse, RecipeRequest,
        RecipeResponse, RecipeWrite, recipe::sort_for_listing,
    },
    state::AppState,
    storage::StorageError,
};

/// Multipart field carrying the upload
const IMAGE_FIELD: &str = "image";

/// Every related id must name an attribute the caller owns
async fn check_related(state: &AppState, owner: i64, write: &RecipeWrite) -> ApiResult<()> {
    let mut errors = FieldErrors::new();

    for (kind, ids) in [
        (AttributeKind::Tag, &write.tag_ids),
        (AttributeKind::Ingredient, &write.ingredient_ids),
    ] {
        if ids.is_empty() {
            continue;
        }
        let found = state.attributes(kind).find_many(owner, ids).await?;
        for id in ids {
            if !found.iter().any(|attribute| attribute.id == *id) {
                errors.add(
                    kind.recipe_field(),
                    format!("Invalid pk \"{}\" - object does not exist.", id),
                );
            }
        }
    }

    errors.into_result()
}

async fn find_owned(state: &AppState, owner: i64, id: i64) -> ApiResult<Recipe> {
    state
        .recipe_repository
        .find(owner, id)
        .await?
        .ok_or(ApiError::NotFound)
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<RecipeQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.into_filter()?;
    let mut recipes = state.recipe_repository.list(user.id, &filter).await?;
    sort_for_listing(&mut recipes);

    let body: Vec<RecipeResponse> = recipes
        .iter()
        .map(|recipe| RecipeResponse::new(recipe, &state.media_storage))
        .collect();
    Ok(Json(body))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<RecipeRequest>,
) -> ApiResult<impl IntoResponse> {
    let write = payload.into_write()?;
    check_related(&state, user.id, &write).await?;

    let recipe = state.recipe_repository.create(user.id, &write).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse::new(&recipe, &state.media_storage)),
    ))
}

/// Single recipe with its tags and ingredients nested
pub async fn retrieve(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let recipe = find_owned(&state, user.id, id).await?;

    let tags = state
        .tag_repository
        .find_many(user.id, &recipe.tag_ids)
        .await?;
    let ingredients = state
        .ingredient_repository
        .find_many(user.id, &recipe.ingredient_ids)
        .await?;

    Ok(Json(RecipeDetailResponse::new(
        &recipe,
        &tags,
        &ingredients,
        &state.media_storage,
    )))
}

async fn save(
    state: &AppState,
    owner: i64,
    id: i64,
    write: RecipeWrite,
) -> ApiResult<Json<RecipeResponse>> {
    check_related(state, owner, &write).await?;

    let recipe = state
        .recipe_repository
        .update(owner, id, &write)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(RecipeResponse::new(&recipe, &state.media_storage)))
}

/// PUT: full replacement, absent relation lists are cleared
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<RecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    find_owned(&state, user.id, id).await?;
    let write = payload.into_write()?;
    save(&state, user.id, id, write).await
}

/// PATCH: supplied fields are merged over the stored recipe
pub async fn partial_update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<RecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    let existing = find_owned(&state, user.id, id).await?;
    let write = payload.merge_into(&existing)?;
    save(&state, user.id, id, write).await
}

pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.recipe_repository.delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Store an image for the recipe from the multipart field `image`
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    find_owned(&state, user.id, id).await?;

    let mut multipart =
        multipart.map_err(|rejection| ApiError::field(IMAGE_FIELD, rejection.body_text()))?;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::field(IMAGE_FIELD, e.body_text()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::field(IMAGE_FIELD, e.body_text()))?;
            data = Some(bytes.to_vec());
            break;
        }
    }

    let data = data.ok_or_else(|| ApiError::field(IMAGE_FIELD, "No file was submitted."))?;

    let path = state
        .media_storage
        .save_recipe_image(data)
        .await
        .map_err(|e| match e {
            StorageError::InvalidImage(message) => ApiError::field(IMAGE_FIELD, message),
            other => ApiError::Internal(other.into()),
        })?;

    // the recipe may have been deleted while the upload was stored
    let recipe = match state.recipe_repository.set_image(user.id, id, &path).await {
        Ok(Some(recipe)) => recipe,
        Ok(None) => {
            state.media_storage.remove(&path).await;
            return Err(ApiError::NotFound);
        }
        Err(e) => {
            state.media_storage.remove(&path).await;
            return Err(e);
        }
    };

    info!("Attached image {} to recipe {}", path, recipe.id);
    Ok(Json(RecipeImageResponse::new(&recipe, &state.media_storage)))
}
