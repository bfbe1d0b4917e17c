//! Tenant selection and church-scoped user endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::users::{
    AvailableChurchesResponse, CreateUserRequest, SelectChurchRequest, UpdateUserRequest,
};
use crate::middleware::{AuthUser, ChurchContext};
use crate::models::{ChurchSelection, ResolvedChurchView, SanitizedUser, UserRole, UserUpdate};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/users/available-churches",
    responses(
        (status = 200, description = "Churches the caller may act within", body = AvailableChurchesResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dtos::ErrorResponse),
        (status = 503, description = "Store unavailable, retry", body = crate::dtos::ErrorResponse)
    ),
    tag = "Tenant",
    security(("bearer_auth" = []))
)]
pub async fn available_churches(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AvailableChurchesResponse>, AppError> {
    let availability = state.resolver.list_available_churches(user.user_id()).await?;
    Ok(Json(availability.into()))
}

/// Same merge as the available-churches listing, without the envelope.
#[utoipa::path(
    get,
    path = "/users/my-churches",
    responses(
        (status = 200, description = "Churches the caller may act within", body = [ResolvedChurchView]),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Tenant",
    security(("bearer_auth" = []))
)]
pub async fn my_churches(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ResolvedChurchView>>, AppError> {
    let availability = state.resolver.list_available_churches(user.user_id()).await?;
    Ok(Json(availability.into_views()))
}

/// Validate a church choice and echo it back. Nothing is stored; later
/// requests must carry the church id themselves.
#[utoipa::path(
    post,
    path = "/users/select-church",
    request_body = SelectChurchRequest,
    responses(
        (status = 200, description = "Church selected", body = ChurchSelection),
        (status = 403, description = "No access to this church", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User or church not found", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Tenant",
    security(("bearer_auth" = []))
)]
pub async fn select_church(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SelectChurchRequest>,
) -> Result<Json<ChurchSelection>, AppError> {
    req.validate()?;
    let selection = state
        .resolver
        .select_church(user.user_id(), req.church_id.trim())
        .await?;
    Ok(Json(selection))
}

#[utoipa::path(
    get,
    path = "/users",
    params(("x-church-id" = String, Header, description = "Selected church")),
    responses(
        (status = 200, description = "Users whose primary church is the selected church", body = [SanitizedUser]),
        (status = 400, description = "Church context missing", body = crate::dtos::ErrorResponse),
        (status = 403, description = "No access to this church", body = crate::dtos::ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    church: ChurchContext,
) -> Result<Json<Vec<SanitizedUser>>, AppError> {
    Ok(Json(state.auth_service.users_in_church(church.church_id()).await?))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    params(("x-church-id" = String, Header, description = "Selected church")),
    responses(
        (status = 201, description = "User created in the selected church", body = SanitizedUser),
        (status = 400, description = "Church context missing or invalid role", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not an admin, or no access to this church", body = crate::dtos::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    church: ChurchContext,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<SanitizedUser>), AppError> {
    let admin = user.require_role(state.store.as_ref(), UserRole::Admin).await?;
    req.validate()?;

    let church = state
        .church_access
        .authorize_church(&admin, church.church_id())
        .await?;
    let created = state.auth_service.create_user(req, &church).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("x-church-id" = String, Header, description = "Selected church")
    ),
    responses(
        (status = 200, description = "User of the selected church", body = SanitizedUser),
        (status = 403, description = "Admin role required", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such user in the selected church", body = crate::dtos::ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
    church: ChurchContext,
    Path(user_id): Path<String>,
) -> Result<Json<SanitizedUser>, AppError> {
    let admin = caller.require_role(state.store.as_ref(), UserRole::Admin).await?;
    state
        .church_access
        .authorize_church(&admin, church.church_id())
        .await?;
    let user = state
        .auth_service
        .user_in_church(church.church_id(), &user_id)
        .await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    request_body = UpdateUserRequest,
    params(
        ("id" = String, Path, description = "User id"),
        ("x-church-id" = String, Header, description = "Selected church")
    ),
    responses(
        (status = 200, description = "User updated", body = SanitizedUser),
        (status = 400, description = "Invalid role, or an admin demoting themselves", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such user in the selected church", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    church: ChurchContext,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<SanitizedUser>, AppError> {
    let admin = caller.require_role(state.store.as_ref(), UserRole::Admin).await?;
    req.validate()?;
    state
        .church_access
        .authorize_church(&admin, church.church_id())
        .await?;

    let updated = state
        .auth_service
        .update_user(&admin, church.church_id(), &user_id, UserUpdate::try_from(req)?)
        .await?;
    Ok(Json(updated))
}

/// Soft delete: the user is deactivated and keeps its grants for the record.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("x-church-id" = String, Header, description = "Selected church")
    ),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 400, description = "Admins cannot deactivate themselves", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such user in the selected church", body = crate::dtos::ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    church: ChurchContext,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let admin = caller.require_role(state.store.as_ref(), UserRole::Admin).await?;
    state
        .church_access
        .authorize_church(&admin, church.church_id())
        .await?;
    state
        .auth_service
        .update_user(&admin, church.church_id(), &user_id, UserUpdate::deactivate())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
