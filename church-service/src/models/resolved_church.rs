//! Request-scoped projections produced by the tenant access resolver.
//! None of these are persisted.

use serde::Serialize;
use utoipa::ToSchema;

use super::church::{ChurchWithOrganization, OrganizationSummary};

pub const NO_CHURCHES_MESSAGE: &str =
    "This user has no churches assigned. Contact an administrator to assign a church.";
pub const USER_DEACTIVATED_MESSAGE: &str =
    "This user account is deactivated. Contact an administrator to restore access.";

/// A church combined with the caller's effective permissions on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedChurchView {
    #[schema(example = "church-shalom")]
    pub id: String,
    #[schema(example = "Iglesia Shalom")]
    pub name: String,
    pub organization: OrganizationSummary,
    #[schema(example = "ADMIN")]
    pub role: String,
    pub is_primary: bool,
    pub can_access: bool,
}

impl ResolvedChurchView {
    pub fn primary(church: &ChurchWithOrganization, role: &str) -> Self {
        Self {
            id: church.church.id.clone(),
            name: church.church.name.clone(),
            organization: OrganizationSummary::from(&church.organization),
            role: role.to_string(),
            is_primary: true,
            can_access: true,
        }
    }

    pub fn granted(church: &ChurchWithOrganization, role: &str, is_active: bool) -> Self {
        Self {
            id: church.church.id.clone(),
            name: church.church.name.clone(),
            organization: OrganizationSummary::from(&church.organization),
            role: role.to_string(),
            is_primary: false,
            can_access: is_active,
        }
    }
}

/// Outcome of listing a user's churches.
///
/// The empty cases are distinct values so callers can show guidance instead
/// of a blank list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChurchAvailability {
    Available(Vec<ResolvedChurchView>),
    NoneAssigned,
    UserDeactivated,
}

impl ChurchAvailability {
    pub fn from_views(views: Vec<ResolvedChurchView>) -> Self {
        if views.is_empty() {
            ChurchAvailability::NoneAssigned
        } else {
            ChurchAvailability::Available(views)
        }
    }

    pub fn has_access(&self) -> bool {
        matches!(self, ChurchAvailability::Available(_))
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            ChurchAvailability::Available(_) => None,
            ChurchAvailability::NoneAssigned => Some(NO_CHURCHES_MESSAGE),
            ChurchAvailability::UserDeactivated => Some(USER_DEACTIVATED_MESSAGE),
        }
    }

    pub fn into_views(self) -> Vec<ResolvedChurchView> {
        match self {
            ChurchAvailability::Available(views) => views,
            _ => Vec::new(),
        }
    }
}

/// Confirmation returned by a successful church selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChurchSelection {
    pub church_id: String,
    pub church_name: String,
    pub organization_id: String,
    pub organization_name: String,
    #[schema(example = "Context switched to church: Iglesia Shalom")]
    pub message: String,
}

impl From<&ChurchWithOrganization> for ChurchSelection {
    fn from(c: &ChurchWithOrganization) -> Self {
        Self {
            church_id: c.church.id.clone(),
            church_name: c.church.name.clone(),
            organization_id: c.organization.id.clone(),
            organization_name: c.organization.name.clone(),
            message: format!("Context switched to church: {}", c.church.name),
        }
    }
}
