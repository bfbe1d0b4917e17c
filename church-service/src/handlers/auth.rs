use axum::{extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::auth::{LoginRequest, TokenResponse};
use crate::middleware::AuthUser;
use crate::models::SanitizedUser;
use crate::utils::Password;
use crate::AppState;

/// Exchange email and password for an access token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials or inactive user", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    req.validate()?;
    let token = state
        .auth_service
        .login(&req.email, &Password::new(req.password))
        .await?;
    Ok(Json(token))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = SanitizedUser),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User no longer exists", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SanitizedUser>, AppError> {
    Ok(Json(state.auth_service.current_user(user.user_id()).await?))
}

/// Re-issue a token from the current stored user record.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Missing or invalid token, or user inactive", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User no longer exists", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn refresh(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(state.auth_service.refresh(user.user_id()).await?))
}
