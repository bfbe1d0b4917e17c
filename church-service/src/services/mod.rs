//! Domain services: storage, tenant access resolution, sessions.

mod auth;
mod church_access;
mod churches;
mod credential_store;
mod database;
pub mod error;
mod jwt;
pub mod metrics;
pub mod tenant_access;

pub use auth::AuthService;
pub use church_access::ChurchAccessService;
pub use churches::ChurchService;
pub use credential_store::{CredentialStore, InMemoryStore, MemberStore};
pub use database::Database;
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService};
pub use tenant_access::{merge_available_churches, AccessPolicy, TenantAccessResolver};
