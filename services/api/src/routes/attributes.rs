//! Tag and ingredient handlers, shared by both kinds through `Extension<AttributeKind>`

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, JsonBody},
    models::{
        AttributeKind, AttributeRequest, AttributeResponse, attribute::sort_for_listing,
    },
    state::AppState,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    AuthUser(user): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let mut rows = state.attributes(kind).list(user.id).await?;
    sort_for_listing(&mut rows);

    let body: Vec<AttributeResponse> = rows.iter().map(Into::into).collect();
    Ok(Json(body))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<AttributeRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = payload.into_name()?;
    let row = state.attributes(kind).create(user.id, &name).await?;

    Ok((StatusCode::CREATED, Json(AttributeResponse::from(&row))))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let row = state
        .attributes(kind)
        .find(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(AttributeResponse::from(&row)))
}

/// PUT: `name` is required
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<AttributeRequest>,
) -> ApiResult<impl IntoResponse> {
    let repository = state.attributes(kind);
    repository
        .find(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let name = payload.into_name()?;
    let row = repository
        .rename(user.id, id, &name)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(AttributeResponse::from(&row)))
}

/// PATCH: an absent `name` leaves the row as it is
pub async fn partial_update(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<AttributeRequest>,
) -> ApiResult<impl IntoResponse> {
    let repository = state.attributes(kind);
    let existing = repository
        .find(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if payload.name.is_none() {
        return Ok(Json(AttributeResponse::from(&existing)));
    }

    let name = payload.into_name()?;
    let row = repository
        .rename(user.id, id, &name)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(AttributeResponse::from(&row)))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.attributes(kind).delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
