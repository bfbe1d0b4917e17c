pub mod auth;
pub mod church_context;

pub use auth::{auth_middleware, AuthUser};
pub use church_context::{church_context_middleware, extract_church_claim, ChurchContext};
