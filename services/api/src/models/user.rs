//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    error::{ApiError, ApiResult, FieldErrors},
    password::hash_password,
    validation::{validate_email, validate_password, validate_required_text},
};

/// User entity. Identified by email; the password is only ever held hashed.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload, ready to be stored
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    /// Build a regular user: email normalized, password hashed
    pub fn create_user(email: &str, password: &str, name: &str) -> ApiResult<Self> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ApiError::field("email", "Users must have an email address"));
        }

        Ok(Self {
            email,
            name: name.trim().to_string(),
            password_hash: hash_password(password)?,
            is_staff: false,
            is_superuser: false,
        })
    }

    /// Build a superuser, which is always staff as well
    pub fn create_superuser(email: &str, password: &str, name: &str) -> ApiResult<Self> {
        let mut user = Self::create_user(email, password, name)?;
        user.is_staff = true;
        user.is_superuser = true;
        Ok(user)
    }
}

/// User update payload. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.password_hash.is_none()
    }
}

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Request for user registration
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl CreateUserRequest {
    /// Field validation shared by signup and full profile replacement
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(
            "email",
            validate_email(&normalize_email(self.email.as_deref().unwrap_or_default())),
        );
        errors.check(
            "password",
            validate_password(self.password.as_deref().unwrap_or_default()),
        );
        errors.check(
            "name",
            validate_required_text(self.name.as_deref().unwrap_or_default(), "Name"),
        );
        errors.into_result()
    }
}

/// Request for a token
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TokenRequest {
    /// The normalized email and raw password, or errors for blank fields
    pub fn credentials(&self) -> ApiResult<(String, &str)> {
        let email = normalize_email(self.email.as_deref().unwrap_or_default());
        let password = self.password.as_deref().unwrap_or_default();

        let mut errors = FieldErrors::new();
        if email.is_empty() {
            errors.add("email", "This field may not be blank");
        }
        if password.is_empty() {
            errors.add("password", "This field may not be blank");
        }
        errors.into_result()?;

        Ok((email, password))
    }
}

/// Partial update of the caller's own profile
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

impl UpdateMeRequest {
    /// Validate the supplied fields and turn them into column changes
    pub fn into_changes(self) -> ApiResult<UpdateUser> {
        let mut errors = FieldErrors::new();
        let mut changes = UpdateUser::default();

        if let Some(email) = self.email {
            let email = normalize_email(&email);
            errors.check("email", validate_email(&email));
            changes.email = Some(email);
        }
        if let Some(name) = self.name {
            errors.check("name", validate_required_text(&name, "Name"));
            changes.name = Some(name.trim().to_string());
        }
        if let Some(password) = self.password {
            errors.check("password", validate_password(&password));
            if errors.is_empty() {
                changes.password_hash = Some(hash_password(&password)?);
            }
        }

        errors.into_result()?;
        Ok(changes)
    }
}

/// Response for user creation
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Response for the caller's own profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub email: String,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Response for token issuance
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: u64,
}
