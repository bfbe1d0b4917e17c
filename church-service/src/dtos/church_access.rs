use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{GrantEvent, GrantHistory, GrantState, GrantWithChurch, OrganizationSummary};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantChurchAccessRequest {
    #[validate(length(min = 1, message = "churchId is required"))]
    #[schema(example = "church-fuente")]
    pub church_id: String,

    #[validate(length(min = 1, message = "role is required"))]
    #[schema(example = "LEADER")]
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChurchAccessResponse {
    pub id: String,
    pub user_id: String,
    pub church_id: String,
    pub church_name: String,
    pub organization: OrganizationSummary,
    pub role: String,
    pub state: GrantState,
    /// Every transition of this grant, oldest first. Omitted on write responses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<GrantEvent>,
}

impl From<GrantWithChurch> for ChurchAccessResponse {
    fn from(g: GrantWithChurch) -> Self {
        let state = g.grant.state();
        Self {
            id: g.grant.id,
            user_id: g.grant.user_id,
            church_id: g.grant.church_id,
            church_name: g.church.church.name.clone(),
            organization: OrganizationSummary::from(&g.church.organization),
            role: g.grant.role,
            state,
            history: Vec::new(),
        }
    }
}

impl From<GrantHistory> for ChurchAccessResponse {
    fn from(h: GrantHistory) -> Self {
        Self {
            history: h.events,
            ..Self::from(h.grant)
        }
    }
}
