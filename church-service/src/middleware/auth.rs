use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::models::{User, UserRole};
use crate::services::{AccessTokenClaims, CredentialStore, ServiceError};
use crate::AppState;

/// Require a valid `Authorization: Bearer` token and stash its claims.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state.jwt.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Authenticated caller, read from the claims `auth_middleware` inserted.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessTokenClaims);

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.0.sub
    }

    /// Reload the caller and check the stored role, not the one in the token.
    /// A user deactivated or demoted after login loses the role at once.
    pub async fn require_role(
        &self,
        store: &dyn CredentialStore,
        role: UserRole,
    ) -> Result<User, ServiceError> {
        let user = store
            .find_user_by_id(&self.0.sub)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Inactive user presented a live token");
            return Err(ServiceError::UserInactive);
        }
        if user.role() != role {
            tracing::warn!(
                user_id = %user.id,
                required = %role,
                stored = %user.role,
                "Role check failed"
            );
            return Err(ServiceError::InsufficientRole(role.to_string()));
        }
        Ok(user)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<AccessTokenClaims>()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

        Ok(AuthUser(claims.clone()))
    }
}
