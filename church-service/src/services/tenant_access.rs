//! Tenant access resolution.
//!
//! Answers which churches a user may act within and whether a specific
//! church claim is allowed. Holds no state besides the store handle, so one
//! resolver is shared by every request.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

use super::credential_store::CredentialStore;
use super::error::ServiceError;
use crate::models::{
    ChurchAvailability, ChurchSelection, ChurchWithOrganization, GrantWithChurch,
    ResolvedChurchView, User,
};

#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    /// When set, a deactivated user has no tenant access at all.
    pub deny_inactive_users: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            deny_inactive_users: true,
        }
    }
}

/// Merge the primary church and active grants into one view list.
///
/// Primary comes first. Grants follow in input order, skipping revoked
/// grants, the primary church and repeats.
pub fn merge_available_churches(
    primary: Option<(&ChurchWithOrganization, &str)>,
    grants: &[GrantWithChurch],
) -> Vec<ResolvedChurchView> {
    let mut seen = HashSet::new();
    let mut views = Vec::with_capacity(grants.len() + 1);

    if let Some((church, role)) = primary {
        seen.insert(church.id().to_string());
        views.push(ResolvedChurchView::primary(church, role));
    }

    for g in grants.iter().filter(|g| g.grant.is_active) {
        if seen.insert(g.church.id().to_string()) {
            views.push(ResolvedChurchView::granted(
                &g.church,
                &g.grant.role,
                g.grant.is_active,
            ));
        }
    }

    views
}

#[derive(Clone)]
pub struct TenantAccessResolver {
    store: Arc<dyn CredentialStore>,
    policy: AccessPolicy,
}

impl TenantAccessResolver {
    pub fn new(store: Arc<dyn CredentialStore>, policy: AccessPolicy) -> Self {
        Self { store, policy }
    }

    async fn load_user(&self, user_id: &str) -> Result<User, ServiceError> {
        if user_id.trim().is_empty() {
            return Err(ServiceError::Validation("User id is required".to_string()));
        }
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    fn is_blocked(&self, user: &User) -> bool {
        self.policy.deny_inactive_users && !user.is_active
    }

    #[instrument(skip(self))]
    pub async fn list_available_churches(
        &self,
        user_id: &str,
    ) -> Result<ChurchAvailability, ServiceError> {
        let user = self.load_user(user_id).await?;
        if self.is_blocked(&user) {
            tracing::warn!(user_id = %user.id, "Deactivated user listed churches");
            return Ok(ChurchAvailability::UserDeactivated);
        }

        let primary = match user.church_id.as_deref() {
            Some(church_id) => {
                let church = self.store.find_church(church_id).await?;
                if church.is_none() {
                    tracing::warn!(user_id = %user.id, church_id, "Primary church does not exist");
                }
                church
            }
            None => None,
        };
        let grants = self.store.active_grants_for_user(&user.id).await?;

        let views = merge_available_churches(
            primary.as_ref().map(|c| (c, user.role.as_str())),
            &grants,
        );
        tracing::debug!(user_id = %user.id, count = views.len(), "Resolved available churches");

        Ok(ChurchAvailability::from_views(views))
    }

    /// `Ok(false)` means no access. Errors are reserved for missing users and
    /// store failures.
    #[instrument(skip(self))]
    pub async fn validate_access(&self, user_id: &str, church_id: &str) -> Result<bool, ServiceError> {
        if church_id.trim().is_empty() {
            return Err(ServiceError::Validation("Church id is required".to_string()));
        }
        let user = self.load_user(user_id).await?;

        if self.is_blocked(&user) {
            tracing::warn!(user_id = %user.id, church_id, "Tenant access denied: user deactivated");
            return Ok(false);
        }

        if user.is_primary_church(church_id) {
            return Ok(true);
        }

        let granted = self
            .store
            .find_active_grant(&user.id, church_id)
            .await?
            .is_some();
        if !granted {
            tracing::warn!(user_id = %user.id, church_id, "Tenant access denied: no active grant");
        }
        Ok(granted)
    }

    /// Validate and echo the selection. Nothing is persisted.
    #[instrument(skip(self))]
    pub async fn select_church(
        &self,
        user_id: &str,
        church_id: &str,
    ) -> Result<ChurchSelection, ServiceError> {
        if !self.validate_access(user_id, church_id).await? {
            return Err(ServiceError::NoChurchAccess);
        }

        let church = self
            .store
            .find_church(church_id)
            .await?
            .ok_or(ServiceError::ChurchNotFound)?;

        tracing::info!(user_id, church_id, "Church selected");
        Ok(ChurchSelection::from(&church))
    }
}
