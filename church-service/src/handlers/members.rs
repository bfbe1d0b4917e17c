//! Church-scoped member CRUD. Every handler reads the church from
//! [`ChurchContext`]; a member of another church is reported as missing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::members::{CreateMemberRequest, UpdateMemberRequest};
use crate::middleware::ChurchContext;
use crate::models::{Member, MemberStats, NewMember};
use crate::services::ServiceError;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/members",
    params(("x-church-id" = String, Header, description = "Selected church")),
    responses(
        (status = 200, description = "Members of the selected church", body = [Member]),
        (status = 400, description = "Church context missing", body = crate::dtos::ErrorResponse),
        (status = 403, description = "No access to this church", body = crate::dtos::ErrorResponse)
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
pub async fn list_members(
    State(state): State<AppState>,
    church: ChurchContext,
) -> Result<Json<Vec<Member>>, AppError> {
    Ok(Json(state.members.list_members(church.church_id()).await?))
}

#[utoipa::path(
    post,
    path = "/members",
    request_body = CreateMemberRequest,
    params(("x-church-id" = String, Header, description = "Selected church")),
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Church context missing", body = crate::dtos::ErrorResponse),
        (status = 403, description = "No access to this church", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
pub async fn create_member(
    State(state): State<AppState>,
    church: ChurchContext,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    req.validate()?;
    let member = NewMember::from(req).into_member(church.church_id(), Utc::now());
    state.members.insert_member(&member).await?;
    tracing::info!(member_id = %member.id, church_id = %member.church_id, "Member created");
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    get,
    path = "/members/stats",
    params(("x-church-id" = String, Header, description = "Selected church")),
    responses(
        (status = 200, description = "Member counts by status", body = MemberStats),
        (status = 400, description = "Church context missing", body = crate::dtos::ErrorResponse),
        (status = 403, description = "No access to this church", body = crate::dtos::ErrorResponse)
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
pub async fn member_stats(
    State(state): State<AppState>,
    church: ChurchContext,
) -> Result<Json<MemberStats>, AppError> {
    Ok(Json(state.members.member_stats(church.church_id()).await?))
}

#[utoipa::path(
    get,
    path = "/members/{id}",
    params(
        ("id" = String, Path, description = "Member id"),
        ("x-church-id" = String, Header, description = "Selected church")
    ),
    responses(
        (status = 200, description = "Member", body = Member),
        (status = 404, description = "Member not found in the selected church", body = crate::dtos::ErrorResponse)
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
pub async fn get_member(
    State(state): State<AppState>,
    church: ChurchContext,
    Path(id): Path<String>,
) -> Result<Json<Member>, AppError> {
    let member = state
        .members
        .find_member(church.church_id(), &id)
        .await?
        .ok_or(ServiceError::MemberNotFound)?;
    Ok(Json(member))
}

#[utoipa::path(
    patch,
    path = "/members/{id}",
    request_body = UpdateMemberRequest,
    params(
        ("id" = String, Path, description = "Member id"),
        ("x-church-id" = String, Header, description = "Selected church")
    ),
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 404, description = "Member not found in the selected church", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
pub async fn update_member(
    State(state): State<AppState>,
    church: ChurchContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<Member>, AppError> {
    req.validate()?;
    let member = state
        .members
        .update_member(church.church_id(), &id, req.into())
        .await?
        .ok_or(ServiceError::MemberNotFound)?;
    Ok(Json(member))
}

#[utoipa::path(
    delete,
    path = "/members/{id}",
    params(
        ("id" = String, Path, description = "Member id"),
        ("x-church-id" = String, Header, description = "Selected church")
    ),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 404, description = "Member not found in the selected church", body = crate::dtos::ErrorResponse)
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
pub async fn delete_member(
    State(state): State<AppState>,
    church: ChurchContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.members.delete_member(church.church_id(), &id).await? {
        return Err(ServiceError::MemberNotFound.into());
    }
    tracing::info!(member_id = %id, church_id = %church.church_id(), "Member deleted");
    Ok(StatusCode::NO_CONTENT)
}
