//! Admin endpoints for secondary church grants.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::church_access::{ChurchAccessResponse, GrantChurchAccessRequest};
use crate::middleware::AuthUser;
use crate::models::UserRole;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/users/{id}/church-access",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Grants in the caller's organizations, each with its event trail", body = [ChurchAccessResponse]),
        (status = 403, description = "Admin role required", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Church Access",
    security(("bearer_auth" = []))
)]
pub async fn list_grants(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ChurchAccessResponse>>, AppError> {
    let admin = caller.require_role(state.store.as_ref(), UserRole::Admin).await?;
    let grants = state.church_access.history(&admin, &user_id).await?;
    Ok(Json(grants.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/users/{id}/church-access",
    params(("id" = String, Path, description = "User id")),
    request_body = GrantChurchAccessRequest,
    responses(
        (status = 201, description = "Grant created or reactivated", body = ChurchAccessResponse),
        (status = 400, description = "Primary church or invalid role", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Caller deactivated", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Admin role required or church outside the caller's organizations", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User or church not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Church Access",
    security(("bearer_auth" = []))
)]
pub async fn grant_access(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
    Json(req): Json<GrantChurchAccessRequest>,
) -> Result<(StatusCode, Json<ChurchAccessResponse>), AppError> {
    let admin = caller.require_role(state.store.as_ref(), UserRole::Admin).await?;
    req.validate()?;
    let grant = state
        .church_access
        .grant(&admin, &user_id, req.church_id.trim(), &req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(grant.into())))
}

#[utoipa::path(
    delete,
    path = "/users/{id}/church-access/{church_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("church_id" = String, Path, description = "Church id")
    ),
    responses(
        (status = 200, description = "Grant revoked; the row is kept", body = ChurchAccessResponse),
        (status = 403, description = "Admin role required", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No active grant", body = crate::dtos::ErrorResponse)
    ),
    tag = "Church Access",
    security(("bearer_auth" = []))
)]
pub async fn revoke_access(
    State(state): State<AppState>,
    caller: AuthUser,
    Path((user_id, church_id)): Path<(String, String)>,
) -> Result<Json<ChurchAccessResponse>, AppError> {
    let admin = caller.require_role(state.store.as_ref(), UserRole::Admin).await?;
    let grant = state
        .church_access
        .revoke(&admin, &user_id, &church_id)
        .await?;
    Ok(Json(grant.into()))
}
