//! Grant administration: issue, list and soft-revoke secondary church access.
//!
//! An admin only manages grants for churches they can act within themselves,
//! and only inside organizations they administer.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;

use super::credential_store::CredentialStore;
use super::error::ServiceError;
use super::tenant_access::TenantAccessResolver;
use crate::models::{ChurchWithOrganization, GrantHistory, GrantWithChurch, User, UserRole};

#[derive(Clone)]
pub struct ChurchAccessService {
    store: Arc<dyn CredentialStore>,
    resolver: TenantAccessResolver,
}

impl ChurchAccessService {
    pub fn new(store: Arc<dyn CredentialStore>, resolver: TenantAccessResolver) -> Self {
        Self { store, resolver }
    }

    /// The admin's primary organization plus every organization in which they
    /// hold an active ADMIN grant.
    pub async fn administered_organizations(
        &self,
        admin: &User,
    ) -> Result<HashSet<String>, ServiceError> {
        let mut orgs: HashSet<String> = admin.organization_id.iter().cloned().collect();
        for g in self.store.active_grants_for_user(&admin.id).await? {
            if g.grant.role.parse::<UserRole>().ok() == Some(UserRole::Admin) {
                orgs.insert(g.church.organization.id.clone());
            }
        }
        Ok(orgs)
    }

    /// Fails with `NoChurchAccess` unless the admin can act within `church`
    /// and administers its organization.
    pub async fn authorize(
        &self,
        admin: &User,
        church: &ChurchWithOrganization,
    ) -> Result<(), ServiceError> {
        let reachable = self.resolver.validate_access(&admin.id, church.id()).await?;
        let administered = self
            .administered_organizations(admin)
            .await?
            .contains(&church.organization.id);

        if reachable && administered {
            Ok(())
        } else {
            tracing::warn!(
                admin_id = %admin.id,
                church_id = %church.id(),
                organization_id = %church.organization.id,
                reachable,
                administered,
                "Grant change refused outside the admin's scope"
            );
            Err(ServiceError::NoChurchAccess)
        }
    }

    /// Load `church_id` and authorize the admin for it.
    pub async fn authorize_church(
        &self,
        admin: &User,
        church_id: &str,
    ) -> Result<ChurchWithOrganization, ServiceError> {
        let church = self
            .store
            .find_church(church_id)
            .await?
            .ok_or(ServiceError::ChurchNotFound)?;
        self.authorize(admin, &church).await?;
        Ok(church)
    }

    /// Grants of `user_id` inside the admin's organizations, each with its
    /// event trail.
    pub async fn history(
        &self,
        admin: &User,
        user_id: &str,
    ) -> Result<Vec<GrantHistory>, ServiceError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        let orgs = self.administered_organizations(admin).await?;

        let mut events_by_grant: HashMap<String, Vec<_>> = HashMap::new();
        for event in self.store.grant_events_for_user(user_id).await? {
            events_by_grant
                .entry(event.grant_id.clone())
                .or_default()
                .push(event);
        }

        Ok(self
            .store
            .grant_history_for_user(user_id)
            .await?
            .into_iter()
            .filter(|g| orgs.contains(&g.church.organization.id))
            .map(|grant| GrantHistory {
                events: events_by_grant.remove(&grant.grant.id).unwrap_or_default(),
                grant,
            })
            .collect())
    }

    /// Create or reactivate the single grant for (user, church).
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn grant(
        &self,
        admin: &User,
        user_id: &str,
        church_id: &str,
        role: &str,
    ) -> Result<GrantWithChurch, ServiceError> {
        let role = role.parse::<UserRole>().map_err(ServiceError::Validation)?;
        if admin.id == user_id {
            return Err(ServiceError::Validation(
                "Administrators cannot grant church access to themselves".to_string(),
            ));
        }

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        let church = self.authorize_church(admin, church_id).await?;

        if user.is_primary_church(church_id) {
            return Err(ServiceError::Validation(
                "Church is the user's primary church; access is implicit".to_string(),
            ));
        }

        let grant = self
            .store
            .upsert_grant(&user.id, church_id, role.as_str(), Some(&admin.id), Utc::now())
            .await?;
        tracing::info!(user_id, church_id, role = %role, "Church access granted");
        Ok(GrantWithChurch { grant, church })
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn revoke(
        &self,
        admin: &User,
        user_id: &str,
        church_id: &str,
    ) -> Result<GrantWithChurch, ServiceError> {
        let church = self.authorize_church(admin, church_id).await?;

        let grant = self
            .store
            .revoke_grant(user_id, church_id, Some(&admin.id), Utc::now())
            .await?
            .ok_or(ServiceError::GrantNotFound)?;
        tracing::info!(user_id, church_id, "Church access revoked");
        Ok(GrantWithChurch { grant, church })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::services::{AccessPolicy, InMemoryStore};

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: ChurchAccessService,
        admin: User,
    }

    async fn add_user(store: &InMemoryStore, id: &str, role: UserRole, primary: Option<(&str, &str)>) -> User {
        let mut new_user = NewUser::new(
            format!("{}@example.com", id),
            "h".to_string(),
            id.to_string(),
            "Test".to_string(),
            role,
        );
        if let Some((org, church)) = primary {
            new_user = new_user.with_primary_church(org.to_string(), church.to_string());
        }
        let mut user = new_user.into_user(Utc::now());
        user.id = id.to_string();
        store.insert_user(&user).await.unwrap();
        user
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        store.add_organization("org-a", "A").unwrap();
        store.add_organization("org-b", "B").unwrap();
        store.add_church("church-a1", "org-a", "A1").unwrap();
        store.add_church("church-a2", "org-a", "A2").unwrap();
        store.add_church("church-b1", "org-b", "B1").unwrap();

        let admin = add_user(&store, "admin", UserRole::Admin, Some(("org-a", "church-a1"))).await;
        add_user(&store, "bob", UserRole::User, None).await;
        store
            .upsert_grant("admin", "church-a2", "LEADER", None, Utc::now())
            .await
            .unwrap();

        let resolver = TenantAccessResolver::new(store.clone(), AccessPolicy::default());
        Fixture {
            service: ChurchAccessService::new(store.clone(), resolver),
            store,
            admin,
        }
    }

    #[tokio::test]
    async fn grants_stay_inside_the_admins_reach() {
        let f = fixture().await;

        f.service
            .grant(&f.admin, "bob", "church-a2", "USER")
            .await
            .unwrap();

        let err = f
            .service
            .grant(&f.admin, "bob", "church-b1", "USER")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoChurchAccess));
        assert!(f.store.find_active_grant("bob", "church-b1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reachable_church_in_a_foreign_organization_is_refused() {
        let f = fixture().await;
        // A LEADER grant makes church-b1 reachable but not administered.
        f.store
            .upsert_grant("admin", "church-b1", "LEADER", None, Utc::now())
            .await
            .unwrap();

        let err = f
            .service
            .grant(&f.admin, "bob", "church-b1", "USER")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoChurchAccess));

        f.store
            .upsert_grant("admin", "church-b1", "ADMIN", None, Utc::now())
            .await
            .unwrap();
        assert!(f.service.grant(&f.admin, "bob", "church-b1", "USER").await.is_ok());
    }

    #[tokio::test]
    async fn self_grants_are_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .grant(&f.admin, "admin", "church-a2", "ADMIN")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn history_keeps_every_period() {
        let f = fixture().await;
        f.service.grant(&f.admin, "bob", "church-a2", "LEADER").await.unwrap();
        f.service.revoke(&f.admin, "bob", "church-a2").await.unwrap();
        f.service.grant(&f.admin, "bob", "church-a2", "USER").await.unwrap();

        let history = f.service.history(&f.admin, "bob").await.unwrap();
        assert_eq!(history.len(), 1);
        let trail: Vec<(&str, &str)> = history[0]
            .events
            .iter()
            .map(|e| (e.action.as_str(), e.role.as_str()))
            .collect();
        assert_eq!(
            trail,
            vec![("granted", "LEADER"), ("revoked", "LEADER"), ("granted", "USER")]
        );
        assert!(history[0]
            .events
            .iter()
            .all(|e| e.actor_id.as_deref() == Some("admin")));
    }

    #[tokio::test]
    async fn history_hides_grants_outside_the_admins_organizations() {
        let f = fixture().await;
        f.store
            .upsert_grant("bob", "church-b1", "USER", None, Utc::now())
            .await
            .unwrap();
        f.service.grant(&f.admin, "bob", "church-a2", "USER").await.unwrap();

        let history = f.service.history(&f.admin, "bob").await.unwrap();
        let churches: Vec<&str> = history.iter().map(|h| h.grant.church.id()).collect();
        assert_eq!(churches, vec!["church-a2"]);
    }
}
