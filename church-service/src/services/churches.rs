//! Organization and church directory.
//!
//! Listings are limited to organizations the caller reaches through their
//! available churches. Creating a church puts its creator in charge of it
//! through an ADMIN grant.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

use super::church_access::ChurchAccessService;
use super::credential_store::CredentialStore;
use super::error::ServiceError;
use super::tenant_access::TenantAccessResolver;
use crate::models::{ChurchWithOrganization, NewChurch, NewOrganization, Organization, User, UserRole};

#[derive(Clone)]
pub struct ChurchService {
    store: Arc<dyn CredentialStore>,
    resolver: TenantAccessResolver,
    access: ChurchAccessService,
}

impl ChurchService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        resolver: TenantAccessResolver,
        access: ChurchAccessService,
    ) -> Self {
        Self {
            store,
            resolver,
            access,
        }
    }

    async fn reachable_organization_ids(&self, user_id: &str) -> Result<BTreeSet<String>, ServiceError> {
        Ok(self
            .resolver
            .list_available_churches(user_id)
            .await?
            .into_views()
            .into_iter()
            .filter(|v| v.can_access)
            .map(|v| v.organization.id)
            .collect())
    }

    pub async fn list_organizations(&self, user_id: &str) -> Result<Vec<Organization>, ServiceError> {
        let mut organizations = Vec::new();
        for id in self.reachable_organization_ids(user_id).await? {
            if let Some(org) = self.store.find_organization(&id).await? {
                organizations.push(org);
            }
        }
        organizations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(organizations)
    }

    /// Every church of every reachable organization, grouped by organization.
    pub async fn list_churches(
        &self,
        user_id: &str,
    ) -> Result<Vec<ChurchWithOrganization>, ServiceError> {
        let mut churches = Vec::new();
        for org in self.list_organizations(user_id).await? {
            churches.extend(self.store.list_churches_by_organization(&org.id).await?);
        }
        Ok(churches)
    }

    #[instrument(skip(self, admin, organization, first_church), fields(admin_id = %admin.id))]
    pub async fn create_organization(
        &self,
        admin: &User,
        organization: NewOrganization,
        first_church: NewChurch,
    ) -> Result<ChurchWithOrganization, ServiceError> {
        let now = Utc::now();
        let organization = organization.into_organization(now);
        let church = first_church.into_church(&organization.id, now);

        self.store.insert_organization(&organization, &church).await?;
        self.grant_creator(admin, &church.id).await?;
        tracing::info!(
            organization_id = %organization.id,
            church_id = %church.id,
            "Organization created"
        );
        Ok(ChurchWithOrganization {
            church,
            organization,
        })
    }

    #[instrument(skip(self, admin, church), fields(admin_id = %admin.id))]
    pub async fn create_church(
        &self,
        admin: &User,
        organization_id: &str,
        church: NewChurch,
    ) -> Result<ChurchWithOrganization, ServiceError> {
        let organization = self
            .store
            .find_organization(organization_id)
            .await?
            .ok_or(ServiceError::OrganizationNotFound)?;

        if !self
            .access
            .administered_organizations(admin)
            .await?
            .contains(organization_id)
        {
            tracing::warn!(organization_id, "Church creation refused outside the admin's organizations");
            return Err(ServiceError::NoChurchAccess);
        }

        let church = church.into_church(organization_id, Utc::now());
        self.store.insert_church(&church).await?;
        self.grant_creator(admin, &church.id).await?;
        tracing::info!(church_id = %church.id, "Church created");
        Ok(ChurchWithOrganization {
            church,
            organization,
        })
    }

    async fn grant_creator(&self, admin: &User, church_id: &str) -> Result<(), ServiceError> {
        self.store
            .upsert_grant(
                &admin.id,
                church_id,
                UserRole::Admin.as_str(),
                Some(&admin.id),
                Utc::now(),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::services::{AccessPolicy, InMemoryStore};

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: ChurchService,
        admin: User,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        store.add_organization("org-a", "Alpha").unwrap();
        store.add_organization("org-b", "Beta").unwrap();
        store.add_church("church-a1", "org-a", "A1").unwrap();
        store.add_church("church-a2", "org-a", "A2").unwrap();
        store.add_church("church-b1", "org-b", "B1").unwrap();

        let mut admin = NewUser::new(
            "admin@example.com".to_string(),
            "h".to_string(),
            "Ad".to_string(),
            "Min".to_string(),
            UserRole::Admin,
        )
        .with_primary_church("org-a".to_string(), "church-a1".to_string())
        .into_user(Utc::now());
        admin.id = "admin".to_string();
        store.insert_user(&admin).await.unwrap();

        let resolver = TenantAccessResolver::new(store.clone(), AccessPolicy::default());
        let access = ChurchAccessService::new(store.clone(), resolver.clone());
        Fixture {
            service: ChurchService::new(store.clone(), resolver, access),
            store,
            admin,
        }
    }

    #[tokio::test]
    async fn listings_cover_only_reachable_organizations() {
        let f = fixture().await;

        let orgs: Vec<String> = f
            .service
            .list_organizations("admin")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(orgs, vec!["org-a"]);

        let churches: Vec<String> = f
            .service
            .list_churches("admin")
            .await
            .unwrap()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(churches, vec!["church-a1", "church-a2"]);
    }

    #[tokio::test]
    async fn new_organization_makes_its_creator_admin_of_the_first_church() {
        let f = fixture().await;
        let created = f
            .service
            .create_organization(
                &f.admin,
                NewOrganization {
                    name: "Gamma".to_string(),
                    description: None,
                },
                NewChurch::named("Gamma Central".to_string()),
            )
            .await
            .unwrap();

        let grant = f
            .store
            .find_active_grant("admin", created.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grant.role, "ADMIN");

        let orgs: Vec<String> = f
            .service
            .list_organizations("admin")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(orgs, vec!["Alpha", "Gamma"]);
    }

    #[tokio::test]
    async fn churches_are_created_only_in_administered_organizations() {
        let f = fixture().await;

        let created = f
            .service
            .create_church(&f.admin, "org-a", NewChurch::named("A3".to_string()))
            .await
            .unwrap();
        assert_eq!(created.organization.id, "org-a");

        assert!(matches!(
            f.service
                .create_church(&f.admin, "org-b", NewChurch::named("B2".to_string()))
                .await,
            Err(ServiceError::NoChurchAccess)
        ));
        assert!(matches!(
            f.service
                .create_church(&f.admin, "org-missing", NewChurch::named("X".to_string()))
                .await,
            Err(ServiceError::OrganizationNotFound)
        ));
    }
}
