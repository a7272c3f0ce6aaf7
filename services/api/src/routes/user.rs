//! Signup, token issuance and the caller's own profile

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, JsonBody},
    models::{
        CreateUserRequest, NewUser, ProfileResponse, TokenRequest, TokenResponse,
        UpdateMeRequest, UpdateUser, UserResponse, user::normalize_email,
    },
    password::{hash_password, verify_password, verify_unknown_user},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials";

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let new_user = NewUser::create_user(
        payload.email.as_deref().unwrap_or_default(),
        payload.password.as_deref().unwrap_or_default(),
        payload.name.as_deref().unwrap_or_default(),
    )?;
    let user = state.user_repository.create(&new_user).await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Exchange email and password for a token
pub async fn create_token(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<TokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let (email, password) = payload.credentials()?;

    if !state.rate_limiter.is_allowed(&email).await {
        warn!("Token request for {} refused while banned", email);
        return Err(ApiError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_email(&email)
        .await?
        .filter(|user| user.is_active);

    let authenticated = match &user {
        Some(user) => verify_password(password, &user.password_hash)?,
        None => verify_unknown_user(password)?,
    };

    let user = match user {
        Some(user) if authenticated => user,
        _ => {
            warn!("Failed token request for {}", email);
            state.rate_limiter.record_failure(&email).await;
            return Err(ApiError::field("non_field_errors", INVALID_CREDENTIALS));
        }
    };

    state.rate_limiter.reset(&email).await;
    let token = state.jwt_service.issue_token(&user)?;

    Ok(Json(TokenResponse {
        token,
        expires_in: state.jwt_service.token_expiry(),
    }))
}

/// The caller's profile
pub async fn me(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(ProfileResponse::from(&user))
}

/// Replace email, name and password of the caller
pub async fn replace_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let changes = UpdateUser {
        email: payload.email.as_deref().map(normalize_email),
        name: payload.name.as_deref().map(|name| name.trim().to_string()),
        password_hash: payload.password.as_deref().map(hash_password).transpose()?,
    };
    let updated = state.user_repository.update(user.id, &changes).await?;

    Ok(Json(ProfileResponse::from(&updated)))
}

/// Update only the supplied profile fields of the caller
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<UpdateMeRequest>,
) -> ApiResult<impl IntoResponse> {
    let changes = payload.into_changes()?;
    if changes.is_empty() {
        return Ok(Json(ProfileResponse::from(&user)));
    }

    let updated = state.user_repository.update(user.id, &changes).await?;
    Ok(Json(ProfileResponse::from(&updated)))
}
