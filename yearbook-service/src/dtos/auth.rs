use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::PublicUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    #[schema(example = "Alice Example")]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Sign-in carries no validation rules: a malformed email behaves exactly
/// like an unknown one, so the failure mode stays undifferentiated.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub password: String,
}

/// Sign-up/sign-in response. The refresh token travels only in the cookie.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}
