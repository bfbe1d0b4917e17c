use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Church, ChurchWithOrganization, NewChurch, NewOrganization, OrganizationSummary};

/// New organization together with its first church.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, message = "Organization name is required"))]
    #[schema(example = "Iglesias del Norte")]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(min = 1, message = "First church name is required"))]
    #[schema(example = "Iglesia Central")]
    pub church_name: String,
}

impl CreateOrganizationRequest {
    pub fn into_parts(self) -> (NewOrganization, NewChurch) {
        (
            NewOrganization {
                name: self.name.trim().to_string(),
                description: self.description,
            },
            NewChurch::named(self.church_name.trim().to_string()),
        )
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChurchRequest {
    #[validate(length(min = 1, message = "organizationId is required"))]
    pub organization_id: String,

    #[validate(length(min = 1, message = "Church name is required"))]
    #[schema(example = "Iglesia Fuente de Vida")]
    pub name: String,

    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl From<CreateChurchRequest> for NewChurch {
    fn from(req: CreateChurchRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            address: req.address,
            phone: req.phone,
            email: req.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChurchResponse {
    #[serde(flatten)]
    pub church: Church,
    pub organization: OrganizationSummary,
}

impl From<ChurchWithOrganization> for ChurchResponse {
    fn from(c: ChurchWithOrganization) -> Self {
        Self {
            organization: OrganizationSummary::from(&c.organization),
            church: c.church,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_request_needs_a_first_church() {
        let req: CreateOrganizationRequest =
            serde_json::from_str(r#"{"name":"Norte","churchName":""}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("church_name"));
    }

    #[test]
    fn church_request_checks_contact_email() {
        let req: CreateChurchRequest = serde_json::from_str(
            r#"{"organizationId":"org-central","name":"Nueva","email":"not-an-email"}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }
}
