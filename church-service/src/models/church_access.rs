//! Secondary church grants.
//!
//! One row per (user, church), never hard-deleted. The row holds the current
//! period only; every transition is appended to the grant event log, which is
//! the access history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::church::ChurchWithOrganization;

#[derive(Debug, Clone, FromRow)]
pub struct ChurchAccessGrant {
    pub id: String,
    pub user_id: String,
    pub church_id: String,
    pub role: String,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a grant as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GrantState {
    Active {
        since: DateTime<Utc>,
    },
    Revoked {
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    },
}

impl GrantState {
    pub fn is_active(&self) -> bool {
        matches!(self, GrantState::Active { .. })
    }
}

impl ChurchAccessGrant {
    pub fn state(&self) -> GrantState {
        if self.is_active {
            GrantState::Active {
                since: self.joined_at,
            }
        } else {
            GrantState::Revoked {
                since: self.joined_at,
                until: self.left_at.unwrap_or(self.joined_at),
            }
        }
    }

    /// Apply a (re)grant in place and report which transition it was.
    /// A revoked row starts a new period; an active one only changes role.
    pub fn reactivate(&mut self, role: &str, now: DateTime<Utc>) -> GrantAction {
        let action = if self.is_active {
            GrantAction::Updated
        } else {
            self.joined_at = now;
            self.left_at = None;
            GrantAction::Granted
        };
        self.role = role.to_string();
        self.is_active = true;
        action
    }

    pub fn revoke(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.left_at = Some(now);
    }
}

/// Grant joined with the church it points at.
#[derive(Debug, Clone)]
pub struct GrantWithChurch {
    pub grant: ChurchAccessGrant,
    pub church: ChurchWithOrganization,
}

/// A grant with every transition recorded for it, oldest first.
#[derive(Debug, Clone)]
pub struct GrantHistory {
    pub grant: GrantWithChurch,
    pub events: Vec<GrantEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GrantAction {
    Granted,
    Updated,
    Revoked,
}

impl GrantAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantAction::Granted => "granted",
            GrantAction::Updated => "updated",
            GrantAction::Revoked => "revoked",
        }
    }
}

impl std::str::FromStr for GrantAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "granted" => Ok(GrantAction::Granted),
            "updated" => Ok(GrantAction::Updated),
            "revoked" => Ok(GrantAction::Revoked),
            _ => Err(format!("Invalid grant action: {}", s)),
        }
    }
}

/// Append-only audit row written with every grant transition.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantEvent {
    pub id: String,
    pub grant_id: String,
    pub user_id: String,
    pub church_id: String,
    #[schema(example = "granted")]
    pub action: String,
    /// Role in effect after the transition.
    pub role: String,
    /// Admin who made the change; `None` for system provisioning.
    pub actor_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl GrantEvent {
    pub fn record(
        grant: &ChurchAccessGrant,
        action: GrantAction,
        actor_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            grant_id: grant.id.clone(),
            user_id: grant.user_id.clone(),
            church_id: grant.church_id.clone(),
            action: action.as_str().to_string(),
            role: grant.role.clone(),
            actor_id: actor_id.map(str::to_string),
            occurred_at: now,
        }
    }
}
