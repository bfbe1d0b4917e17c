use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("User not found")]
    UserNotFound,

    #[error("Church not found")]
    ChurchNotFound,

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Member not found")]
    MemberNotFound,

    #[error("No active church access grant")]
    GrantNotFound,

    #[error("No access to this church")]
    NoChurchAccess,

    #[error("Church context required: provide the x-church-id header, the churchId query parameter or a churchId body field")]
    MissingChurchContext,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User is inactive")]
    UserInactive,

    #[error("Insufficient role: {0}")]
    InsufficientRole(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Store timed out or is unreachable. Safe to retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Wrap a sqlx error, separating transient pool/IO failures from real faults.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => ServiceError::Unavailable("connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => ServiceError::Unavailable("connection pool closed".to_string()),
            sqlx::Error::Io(e) => ServiceError::Unavailable(format!("database I/O: {}", e)),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ServiceError::Conflict(format!("Duplicate record: {}", db.message()))
            }
            other => ServiceError::Database(other),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Unavailable(_))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::ChurchNotFound => AppError::NotFound(anyhow::anyhow!("Church not found")),
            ServiceError::OrganizationNotFound => {
                AppError::NotFound(anyhow::anyhow!("Organization not found"))
            }
            ServiceError::MemberNotFound => AppError::NotFound(anyhow::anyhow!("Member not found")),
            ServiceError::GrantNotFound => {
                AppError::NotFound(anyhow::anyhow!("No active church access grant"))
            }
            ServiceError::NoChurchAccess => {
                AppError::Forbidden(anyhow::anyhow!("No access to this church"))
            }
            e @ ServiceError::MissingChurchContext => AppError::BadRequest(anyhow::anyhow!(e.to_string())),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::UserInactive => AppError::Unauthorized(anyhow::anyhow!("User is inactive")),
            ServiceError::InsufficientRole(required) => AppError::Forbidden(anyhow::anyhow!(
                "This operation requires the {} role",
                required
            )),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Unavailable(msg) => AppError::ServiceUnavailable(msg),
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
