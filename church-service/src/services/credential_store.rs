//! Storage seams for users, churches, grants and members.
//!
//! `Database` implements both traits on PostgreSQL. `InMemoryStore` backs
//! tests and local runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::error::ServiceError;
use crate::models::{
    Church, ChurchAccessGrant, ChurchWithOrganization, GrantAction, GrantEvent, GrantWithChurch,
    Member, MemberStats, MemberUpdate, Organization, User,
};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn health_check(&self) -> Result<(), ServiceError>;

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, ServiceError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;

    /// Users whose primary church is `church_id`.
    async fn list_users_by_church(&self, church_id: &str) -> Result<Vec<User>, ServiceError>;

    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError>;

    /// Persist name, role, active flag and `updated_at` of an existing user.
    async fn update_user(&self, user: &User) -> Result<(), ServiceError>;

    async fn find_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<Organization>, ServiceError>;

    /// Insert an organization and its first church together.
    async fn insert_organization(
        &self,
        organization: &Organization,
        first_church: &Church,
    ) -> Result<(), ServiceError>;

    async fn insert_church(&self, church: &Church) -> Result<(), ServiceError>;

    async fn find_church(
        &self,
        church_id: &str,
    ) -> Result<Option<ChurchWithOrganization>, ServiceError>;

    /// Churches of one organization, by name.
    async fn list_churches_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<ChurchWithOrganization>, ServiceError>;

    /// Active grants joined with their churches, oldest first.
    async fn active_grants_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<GrantWithChurch>, ServiceError>;

    /// Every grant ever issued to the user, active and revoked.
    async fn grant_history_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<GrantWithChurch>, ServiceError>;

    async fn find_active_grant(
        &self,
        user_id: &str,
        church_id: &str,
    ) -> Result<Option<ChurchAccessGrant>, ServiceError>;

    /// Create the (user, church) grant or reactivate the existing row, and
    /// append the matching event in the same unit of work.
    async fn upsert_grant(
        &self,
        user_id: &str,
        church_id: &str,
        role: &str,
        actor_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ChurchAccessGrant, ServiceError>;

    /// Soft revoke plus a `revoked` event. Returns `None` when no active
    /// grant exists.
    async fn revoke_grant(
        &self,
        user_id: &str,
        church_id: &str,
        actor_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<ChurchAccessGrant>, ServiceError>;

    /// Every grant transition for the user, oldest first.
    async fn grant_events_for_user(&self, user_id: &str) -> Result<Vec<GrantEvent>, ServiceError>;
}

/// Church-scoped member persistence. Every call filters by `church_id`.
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn list_members(&self, church_id: &str) -> Result<Vec<Member>, ServiceError>;

    async fn find_member(
        &self,
        church_id: &str,
        member_id: &str,
    ) -> Result<Option<Member>, ServiceError>;

    async fn insert_member(&self, member: &Member) -> Result<(), ServiceError>;

    async fn update_member(
        &self,
        church_id: &str,
        member_id: &str,
        update: MemberUpdate,
    ) -> Result<Option<Member>, ServiceError>;

    async fn delete_member(&self, church_id: &str, member_id: &str) -> Result<bool, ServiceError>;

    async fn member_stats(&self, church_id: &str) -> Result<MemberStats, ServiceError>;
}

#[derive(Default)]
struct MemoryState {
    organizations: HashMap<String, Organization>,
    churches: HashMap<String, Church>,
    users: Vec<User>,
    grants: Vec<ChurchAccessGrant>,
    grant_events: Vec<GrantEvent>,
    members: Vec<Member>,
}

impl MemoryState {
    fn church_with_org(&self, church_id: &str) -> Option<ChurchWithOrganization> {
        let church = self.churches.get(church_id)?;
        let organization = self.organizations.get(&church.organization_id)?;
        Some(ChurchWithOrganization {
            church: church.clone(),
            organization: organization.clone(),
        })
    }

    fn grants_with_churches<'a>(
        &self,
        grants: impl Iterator<Item = &'a ChurchAccessGrant>,
    ) -> Vec<GrantWithChurch> {
        let mut out: Vec<GrantWithChurch> = grants
            .filter_map(|g| {
                self.church_with_org(&g.church_id).map(|church| GrantWithChurch {
                    grant: g.clone(),
                    church,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            a.grant
                .joined_at
                .cmp(&b.grant.joined_at)
                .then_with(|| a.grant.id.cmp(&b.grant.id))
        });
        out
    }
}

/// Process-local store guarded by a mutex.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `Unavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("in-memory store offline".to_string()));
        }
        self.state
            .lock()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("In-memory store mutex poisoned: {}", e)))
    }

    pub fn add_organization(&self, id: &str, name: &str) -> Result<Organization, ServiceError> {
        let org = Organization {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        };
        self.lock()?.organizations.insert(org.id.clone(), org.clone());
        Ok(org)
    }

    pub fn add_church(
        &self,
        id: &str,
        organization_id: &str,
        name: &str,
    ) -> Result<Church, ServiceError> {
        let mut state = self.lock()?;
        if !state.organizations.contains_key(organization_id) {
            return Err(ServiceError::Validation(format!(
                "Unknown organization: {}",
                organization_id
            )));
        }
        let church = Church {
            id: id.to_string(),
            organization_id: organization_id.to_string(),
            name: name.to_string(),
            address: None,
            phone: None,
            email: None,
            created_at: Utc::now(),
        };
        state.churches.insert(church.id.clone(), church.clone());
        Ok(church)
    }

    pub fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(ServiceError::UserNotFound)?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(())
    }

    /// Drop a user outright, as if deleted behind the service's back.
    pub fn remove_user(&self, user_id: &str) -> Result<bool, ServiceError> {
        let mut state = self.lock()?;
        let before = state.users.len();
        state.users.retain(|u| u.id != user_id);
        Ok(state.users.len() != before)
    }

    /// Number of grant rows for the pair, active or not.
    pub fn grant_row_count(&self, user_id: &str, church_id: &str) -> Result<usize, ServiceError> {
        Ok(self
            .lock()?
            .grants
            .iter()
            .filter(|g| g.user_id == user_id && g.church_id == church_id)
            .count())
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.lock().map(|_| ())
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let email = email.trim().to_lowercase();
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users_by_church(&self, church_id: &str) -> Result<Vec<User>, ServiceError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .filter(|u| u.church_id.as_deref() == Some(church_id))
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(ServiceError::UserNotFound)?;
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.role = user.role.clone();
        stored.is_active = user.is_active;
        stored.updated_at = user.updated_at;
        Ok(())
    }

    async fn find_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<Organization>, ServiceError> {
        Ok(self.lock()?.organizations.get(organization_id).cloned())
    }

    async fn insert_organization(
        &self,
        organization: &Organization,
        first_church: &Church,
    ) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        if state.organizations.contains_key(&organization.id)
            || state.churches.contains_key(&first_church.id)
        {
            return Err(ServiceError::Conflict("Organization already exists".to_string()));
        }
        state
            .organizations
            .insert(organization.id.clone(), organization.clone());
        state
            .churches
            .insert(first_church.id.clone(), first_church.clone());
        Ok(())
    }

    async fn insert_church(&self, church: &Church) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        if !state.organizations.contains_key(&church.organization_id) {
            return Err(ServiceError::OrganizationNotFound);
        }
        if state.churches.contains_key(&church.id) {
            return Err(ServiceError::Conflict("Church already exists".to_string()));
        }
        state.churches.insert(church.id.clone(), church.clone());
        Ok(())
    }

    async fn find_church(
        &self,
        church_id: &str,
    ) -> Result<Option<ChurchWithOrganization>, ServiceError> {
        Ok(self.lock()?.church_with_org(church_id))
    }

    async fn list_churches_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<ChurchWithOrganization>, ServiceError> {
        let state = self.lock()?;
        let mut churches: Vec<ChurchWithOrganization> = state
            .churches
            .values()
            .filter(|c| c.organization_id == organization_id)
            .filter_map(|c| state.church_with_org(&c.id))
            .collect();
        churches.sort_by(|a, b| a.church.name.cmp(&b.church.name));
        Ok(churches)
    }

    async fn active_grants_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<GrantWithChurch>, ServiceError> {
        let state = self.lock()?;
        Ok(state.grants_with_churches(
            state
                .grants
                .iter()
                .filter(|g| g.user_id == user_id && g.is_active),
        ))
    }

    async fn grant_history_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<GrantWithChurch>, ServiceError> {
        let state = self.lock()?;
        Ok(state.grants_with_churches(state.grants.iter().filter(|g| g.user_id == user_id)))
    }

    async fn find_active_grant(
        &self,
        user_id: &str,
        church_id: &str,
    ) -> Result<Option<ChurchAccessGrant>, ServiceError> {
        Ok(self
            .lock()?
            .grants
            .iter()
            .find(|g| g.user_id == user_id && g.church_id == church_id && g.is_active)
            .cloned())
    }

    async fn upsert_grant(
        &self,
        user_id: &str,
        church_id: &str,
        role: &str,
        actor_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ChurchAccessGrant, ServiceError> {
        let mut state = self.lock()?;
        let existing = state
            .grants
            .iter_mut()
            .find(|g| g.user_id == user_id && g.church_id == church_id);

        let (grant, action) = match existing {
            Some(existing) => {
                let action = existing.reactivate(role, now);
                (existing.clone(), action)
            }
            None => {
                let grant = ChurchAccessGrant {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    church_id: church_id.to_string(),
                    role: role.to_string(),
                    is_active: true,
                    joined_at: now,
                    left_at: None,
                };
                state.grants.push(grant.clone());
                (grant, GrantAction::Granted)
            }
        };

        state
            .grant_events
            .push(GrantEvent::record(&grant, action, actor_id, now));
        Ok(grant)
    }

    async fn revoke_grant(
        &self,
        user_id: &str,
        church_id: &str,
        actor_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<ChurchAccessGrant>, ServiceError> {
        let mut state = self.lock()?;
        let revoked = state
            .grants
            .iter_mut()
            .find(|g| g.user_id == user_id && g.church_id == church_id && g.is_active)
            .map(|g| {
                g.revoke(now);
                g.clone()
            });

        if let Some(grant) = &revoked {
            state
                .grant_events
                .push(GrantEvent::record(grant, GrantAction::Revoked, actor_id, now));
        }
        Ok(revoked)
    }

    async fn grant_events_for_user(&self, user_id: &str) -> Result<Vec<GrantEvent>, ServiceError> {
        // Pushed in order, so insertion order is already chronological.
        Ok(self
            .lock()?
            .grant_events
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MemberStore for InMemoryStore {
    async fn list_members(&self, church_id: &str) -> Result<Vec<Member>, ServiceError> {
        let mut members: Vec<Member> = self
            .lock()?
            .members
            .iter()
            .filter(|m| m.church_id == church_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        Ok(members)
    }

    async fn find_member(
        &self,
        church_id: &str,
        member_id: &str,
    ) -> Result<Option<Member>, ServiceError> {
        Ok(self
            .lock()?
            .members
            .iter()
            .find(|m| m.church_id == church_id && m.id == member_id)
            .cloned())
    }

    async fn insert_member(&self, member: &Member) -> Result<(), ServiceError> {
        self.lock()?.members.push(member.clone());
        Ok(())
    }

    async fn update_member(
        &self,
        church_id: &str,
        member_id: &str,
        update: MemberUpdate,
    ) -> Result<Option<Member>, ServiceError> {
        let mut state = self.lock()?;
        Ok(state
            .members
            .iter_mut()
            .find(|m| m.church_id == church_id && m.id == member_id)
            .map(|m| {
                update.apply(m, Utc::now());
                m.clone()
            }))
    }

    async fn delete_member(&self, church_id: &str, member_id: &str) -> Result<bool, ServiceError> {
        let mut state = self.lock()?;
        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.church_id == church_id && m.id == member_id));
        Ok(state.members.len() != before)
    }

    async fn member_stats(&self, church_id: &str) -> Result<MemberStats, ServiceError> {
        let state = self.lock()?;
        Ok(MemberStats::from_members(
            state.members.iter().filter(|m| m.church_id == church_id),
        ))
    }
}
