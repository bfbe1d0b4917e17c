use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A church is the tenant unit. Its id never changes once created.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Church {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Organization to insert together with its first church.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub description: Option<String>,
}

impl NewOrganization {
    pub fn into_organization(self, now: DateTime<Utc>) -> Organization {
        Organization {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewChurch {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl NewChurch {
    pub fn named(name: String) -> Self {
        Self {
            name,
            address: None,
            phone: None,
            email: None,
        }
    }

    pub fn into_church(self, organization_id: &str, now: DateTime<Utc>) -> Church {
        Church {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            created_at: now,
        }
    }
}

/// Compact organization reference embedded in resolved church views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrganizationSummary {
    pub id: String,
    pub name: String,
}

impl From<&Organization> for OrganizationSummary {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id.clone(),
            name: org.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChurchWithOrganization {
    pub church: Church,
    pub organization: Organization,
}

impl ChurchWithOrganization {
    pub fn id(&self) -> &str {
        &self.church.id
    }
}

/// Flat row produced by joining `churches` with `organizations`.
#[derive(Debug, FromRow)]
pub(crate) struct ChurchOrganizationRow {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub org_name: String,
    pub org_description: Option<String>,
    pub org_created_at: DateTime<Utc>,
}

impl From<ChurchOrganizationRow> for ChurchWithOrganization {
    fn from(row: ChurchOrganizationRow) -> Self {
        Self {
            organization: Organization {
                id: row.organization_id.clone(),
                name: row.org_name,
                description: row.org_description,
                created_at: row.org_created_at,
            },
            church: Church {
                id: row.id,
                organization_id: row.organization_id,
                name: row.name,
                address: row.address,
                phone: row.phone,
                email: row.email,
                created_at: row.created_at,
            },
        }
    }
}
