//! Authentication middleware and request extractors

use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::de::DeserializeOwned;
use serde_path_to_error::Segment;
use tracing::warn;

use crate::{error::ApiError, models::User, state::AppState};

/// Authenticated user, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Pull the token out of `Bearer <token>` or `Token <token>`
fn token_from_header(value: &str) -> Option<&str> {
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = token_from_header(auth_header).ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        warn!("Rejected token: {}", e);
        ApiError::Unauthorized
    })?;
    let user_id = claims.user_id().map_err(|_| ApiError::Unauthorized)?;

    let user = state
        .user_repository
        .find_by_id(user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| {
            warn!("Token for unknown or inactive user {}", user_id);
            ApiError::Unauthorized
        })?;

    req.extensions_mut().insert(AuthUser(user));

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// JSON body extractor whose rejections use the API error shape
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::field("non_field_errors", rejection.body_text()))?;
        deserialize_body(value).map(JsonBody)
    }
}

/// Deserialize a parsed body, keying type errors by the top-level field
fn deserialize_body<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let field = err
            .path()
            .iter()
            .find_map(|segment| match segment {
                Segment::Map { key } => Some(key.clone()),
                _ => None,
            })
            .unwrap_or_else(|| "non_field_errors".to_string());
        ApiError::field(&field, err.into_inner().to_string())
    })
}
