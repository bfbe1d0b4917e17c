//! Organization and church directory endpoints.

use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::churches::{ChurchResponse, CreateChurchRequest, CreateOrganizationRequest};
use crate::middleware::AuthUser;
use crate::models::{Organization, UserRole};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/organizations",
    responses(
        (status = 200, description = "Organizations reachable through the caller's churches", body = [Organization]),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse)
    ),
    tag = "Churches",
    security(("bearer_auth" = []))
)]
pub async fn list_organizations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Organization>>, AppError> {
    Ok(Json(state.churches.list_organizations(user.user_id()).await?))
}

#[utoipa::path(
    post,
    path = "/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization and its first church created", body = ChurchResponse),
        (status = 403, description = "Admin role required", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Churches",
    security(("bearer_auth" = []))
)]
pub async fn create_organization(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<ChurchResponse>), AppError> {
    let admin = caller.require_role(state.store.as_ref(), UserRole::Admin).await?;
    req.validate()?;
    let (organization, first_church) = req.into_parts();
    let created = state
        .churches
        .create_organization(&admin, organization, first_church)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/churches",
    responses(
        (status = 200, description = "Churches of the caller's organizations", body = [ChurchResponse]),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse)
    ),
    tag = "Churches",
    security(("bearer_auth" = []))
)]
pub async fn list_churches(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ChurchResponse>>, AppError> {
    let churches = state.churches.list_churches(user.user_id()).await?;
    Ok(Json(churches.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/churches",
    request_body = CreateChurchRequest,
    responses(
        (status = 201, description = "Church created; the creator holds an ADMIN grant on it", body = ChurchResponse),
        (status = 403, description = "Admin role required or organization not administered", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Organization not found", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Churches",
    security(("bearer_auth" = []))
)]
pub async fn create_church(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<CreateChurchRequest>,
) -> Result<(StatusCode, Json<ChurchResponse>), AppError> {
    let admin = caller.require_role(state.store.as_ref(), UserRole::Admin).await?;
    req.validate()?;
    let organization_id = req.organization_id.trim().to_string();
    let created = state
        .churches
        .create_church(&admin, &organization_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}
