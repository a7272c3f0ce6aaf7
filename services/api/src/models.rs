//! API models for stored records and request/response payloads

pub mod attribute;
pub mod recipe;
pub mod user;

// Re-export for convenience
pub use attribute::{Attribute, AttributeKind, AttributeRequest, AttributeResponse};
pub use recipe::{
    Recipe, RecipeDetailResponse, RecipeImageResponse, RecipeRequest, RecipeResponse, RecipeWrite,
};
pub use user::{
    CreateUserRequest, NewUser, ProfileResponse, TokenRequest, TokenResponse, UpdateMeRequest,
    UpdateUser, User, UserResponse,
};
