use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{MemberStatus, MemberUpdate, NewMember};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub baptism_date: Option<NaiveDate>,
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
}

impl From<CreateMemberRequest> for NewMember {
    fn from(req: CreateMemberRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            address: req.address,
            birth_date: req.birth_date,
            baptism_date: req.baptism_date,
            status: req.status.unwrap_or_default(),
            notes: req.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1, message = "First name must not be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "Last name must not be empty"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub baptism_date: Option<NaiveDate>,
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
}

impl From<UpdateMemberRequest> for MemberUpdate {
    fn from(req: UpdateMemberRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            address: req.address,
            birth_date: req.birth_date,
            baptism_date: req.baptism_date,
            status: req.status,
            notes: req.notes,
        }
    }
}
