use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{ChurchAvailability, ResolvedChurchView, UserRole, UserUpdate};
use crate::services::ServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectChurchRequest {
    #[validate(length(min = 1, message = "churchId is required"))]
    #[schema(example = "church-fuente")]
    pub church_id: String,
}

/// Envelope for the available-churches listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailableChurchesResponse {
    pub churches: Vec<ResolvedChurchView>,
    pub message: Option<String>,
    pub has_access: bool,
}

impl From<ChurchAvailability> for AvailableChurchesResponse {
    fn from(availability: ChurchAvailability) -> Self {
        let has_access = availability.has_access();
        let message = availability.message().map(str::to_string);
        Self {
            churches: availability.into_views(),
            message,
            has_access,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "lider@iglesia.org")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    /// ADMIN, LEADER or USER. Defaults to USER.
    #[schema(example = "LEADER")]
    pub role: Option<String>,
}

/// Partial admin edit. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,

    #[schema(example = "LEADER")]
    pub role: Option<String>,

    pub is_active: Option<bool>,
}

impl TryFrom<UpdateUserRequest> for UserUpdate {
    type Error = ServiceError;

    fn try_from(req: UpdateUserRequest) -> Result<Self, Self::Error> {
        let role = req
            .role
            .as_deref()
            .map(str::parse::<UserRole>)
            .transpose()
            .map_err(ServiceError::Validation)?;
        Ok(UserUpdate {
            first_name: req.first_name,
            last_name: req.last_name,
            role,
            is_active: req.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_availability_envelope_has_message_and_no_access() {
        let body = serde_json::to_value(AvailableChurchesResponse::from(
            ChurchAvailability::NoneAssigned,
        ))
        .unwrap();

        assert_eq!(body["churches"], serde_json::json!([]));
        assert_eq!(body["hasAccess"], false);
        assert!(body["message"].is_string());
    }

    #[test]
    fn select_church_requires_non_empty_id() {
        let req: SelectChurchRequest = serde_json::from_str(r#"{"churchId":""}"#).unwrap();
        assert!(req.validate().is_err());

        let req: SelectChurchRequest =
            serde_json::from_str(r#"{"churchId":"church-shalom"}"#).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn short_passwords_are_rejected() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"email":"a@b.co","password":"123","firstName":"A","lastName":"B"}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn update_request_parses_role_codes() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"role":"leader","isActive":false}"#).unwrap();
        let update = UserUpdate::try_from(req).unwrap();
        assert_eq!(update.role, Some(UserRole::Leader));
        assert_eq!(update.is_active, Some(false));
        assert!(update.first_name.is_none());

        let req: UpdateUserRequest = serde_json::from_str(r#"{"role":"PASTOR"}"#).unwrap();
        assert!(matches!(
            UserUpdate::try_from(req),
            Err(ServiceError::Validation(_))
        ));
    }
}
