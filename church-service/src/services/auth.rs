//! Session issuing and user account operations.

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use super::credential_store::CredentialStore;
use super::error::ServiceError;
use super::jwt::JwtService;
use crate::dtos::auth::TokenResponse;
use crate::dtos::users::CreateUserRequest;
use crate::models::{ChurchWithOrganization, NewUser, SanitizedUser, User, UserRole, UserUpdate};
use crate::utils::{hash_password, verify_dummy, verify_password, Password};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &Password) -> Result<TokenResponse, ServiceError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            verify_dummy(password);
            tracing::warn!("Login failed: unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Login refused: user inactive");
            return Err(ServiceError::UserInactive);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    /// Re-issue a token from the stored record, picking up role or church changes.
    pub async fn refresh(&self, user_id: &str) -> Result<TokenResponse, ServiceError> {
        let user = self.active_user(user_id).await?;
        self.issue(user)
    }

    pub async fn current_user(&self, user_id: &str) -> Result<SanitizedUser, ServiceError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(SanitizedUser::from)
            .ok_or(ServiceError::UserNotFound)
    }

    pub async fn users_in_church(&self, church_id: &str) -> Result<Vec<SanitizedUser>, ServiceError> {
        Ok(self
            .store
            .list_users_by_church(church_id)
            .await?
            .into_iter()
            .map(SanitizedUser::from)
            .collect())
    }

    /// Create a user whose primary church is `church`.
    #[instrument(skip(self, req, church), fields(church_id = %church.id()))]
    pub async fn create_user(
        &self,
        req: CreateUserRequest,
        church: &ChurchWithOrganization,
    ) -> Result<SanitizedUser, ServiceError> {
        let role = match req.role.as_deref() {
            Some(role) => role.parse::<UserRole>().map_err(ServiceError::Validation)?,
            None => UserRole::User,
        };

        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&Password::new(req.password))?;
        let user = NewUser::new(req.email, password_hash, req.first_name, req.last_name, role)
            .with_primary_church(church.organization.id.clone(), church.church.id.clone())
            .into_user(Utc::now());

        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, role = %role, "User created");
        Ok(user.into())
    }

    /// A user whose primary church is `church_id`. Users of other churches
    /// are reported as missing.
    pub async fn user_in_church(
        &self,
        church_id: &str,
        user_id: &str,
    ) -> Result<User, ServiceError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .filter(|u| u.is_primary_church(church_id))
            .ok_or(ServiceError::UserNotFound)
    }

    /// Admin edit of a user of `church_id`. Admins cannot demote or
    /// deactivate themselves.
    #[instrument(skip(self, admin, update), fields(admin_id = %admin.id))]
    pub async fn update_user(
        &self,
        admin: &User,
        church_id: &str,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<SanitizedUser, ServiceError> {
        let mut user = self.user_in_church(church_id, user_id).await?;
        if user.id == admin.id && update.demotes(&user) {
            return Err(ServiceError::Validation(
                "Administrators cannot demote or deactivate themselves".to_string(),
            ));
        }

        update.apply(&mut user, Utc::now());
        self.store.update_user(&user).await?;
        tracing::info!(
            user_id = %user.id,
            role = %user.role,
            is_active = user.is_active,
            "User updated"
        );
        Ok(user.into())
    }

    async fn active_user(&self, user_id: &str) -> Result<User, ServiceError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        if !user.is_active {
            return Err(ServiceError::UserInactive);
        }
        Ok(user)
    }

    fn issue(&self, user: User) -> Result<TokenResponse, ServiceError> {
        let access_token = self.jwt.generate_access_token(&user)?;
        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_expiry_seconds(),
            user: user.into(),
        })
    }
}
