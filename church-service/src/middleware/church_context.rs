//! Church (tenant) context gate.
//!
//! Every tenant-scoped request must name its church explicitly. The claim is
//! taken from, in order, the `x-church-id` header, the `churchId` query
//! parameter and a `churchId` field in a JSON body. It is validated once per
//! request and handed to handlers as an immutable [`ChurchContext`].

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use service_core::error::AppError;

use crate::services::metrics::{record_tenant_decision, TenantDecision};
use crate::services::{AccessTokenClaims, ServiceError};
use crate::AppState;

pub const CHURCH_ID_HEADER: &str = "x-church-id";
pub const CHURCH_ID_FIELD: &str = "churchId";

/// Largest body buffered while looking for a `churchId` field.
pub const MAX_CLAIM_BODY_BYTES: usize = 1024 * 1024;

/// Validated church for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChurchContext {
    church_id: String,
    user_id: String,
}

impl ChurchContext {
    pub fn church_id(&self) -> &str {
        &self.church_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn from_header(headers: &HeaderMap) -> Option<String> {
    non_empty(
        headers
            .get(CHURCH_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    )
}

/// First `churchId` pair wins; repeats are ignored.
fn from_query(query: Option<&str>) -> Option<String> {
    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query?).ok()?;
    non_empty(
        pairs
            .into_iter()
            .find(|(key, _)| key == CHURCH_ID_FIELD)
            .map(|(_, value)| value),
    )
}

fn from_body(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    non_empty(
        value
            .get(CHURCH_ID_FIELD)
            .and_then(|v| v.as_str())
            .map(str::to_string),
    )
}

/// First non-empty church claim: header, then query, then JSON body.
pub fn extract_church_claim(headers: &HeaderMap, query: Option<&str>, body: &[u8]) -> Option<String> {
    from_header(headers)
        .or_else(|| from_query(query))
        .or_else(|| from_body(body))
}

/// Gate a tenant-scoped route. Must run after `auth_middleware`.
pub async fn church_context_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<AccessTokenClaims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

    let mut claim = from_header(req.headers()).or_else(|| from_query(req.uri().query()));

    // The body is only read when the header and query are silent.
    if claim.is_none() {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_CLAIM_BODY_BYTES)
            .await
            .map_err(|e| {
                let e = e.into_inner();
                if e.is::<LengthLimitError>() {
                    AppError::PayloadTooLarge(anyhow::anyhow!(
                        "Request body exceeds {} bytes",
                        MAX_CLAIM_BODY_BYTES
                    ))
                } else {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read body: {}", e))
                }
            })?;
        claim = from_body(&bytes);
        req = Request::from_parts(parts, Body::from(bytes));
    }

    let Some(church_id) = claim else {
        record_tenant_decision(TenantDecision::Missing);
        tracing::warn!(user_id = %claims.sub, "Tenant-scoped request without church claim");
        return Err(ServiceError::MissingChurchContext.into());
    };

    match state.resolver.validate_access(&claims.sub, &church_id).await {
        Ok(true) => {
            record_tenant_decision(TenantDecision::Granted);
        }
        Ok(false) => {
            record_tenant_decision(TenantDecision::Denied);
            return Err(ServiceError::NoChurchAccess.into());
        }
        Err(e) => {
            record_tenant_decision(TenantDecision::Error);
            if e.is_transient() {
                tracing::error!(error = %e, church_id = %church_id, "Tenant validation failed");
            } else {
                tracing::warn!(error = %e, church_id = %church_id, "Tenant validation rejected");
            }
            return Err(e.into());
        }
    }

    tracing::debug!(user_id = %claims.sub, church_id = %church_id, "Church context established");
    req.extensions_mut().insert(ChurchContext {
        church_id,
        user_id: claims.sub,
    });

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ChurchContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ChurchContext>()
            .cloned()
            .ok_or_else(|| AppError::from(ServiceError::MissingChurchContext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(church: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(c) = church {
            h.insert(CHURCH_ID_HEADER, HeaderValue::from_str(c).unwrap());
        }
        h
    }

    #[test]
    fn header_beats_query_and_body() {
        let claim = extract_church_claim(
            &headers(Some("from-header")),
            Some("churchId=from-query"),
            br#"{"churchId":"from-body"}"#,
        );
        assert_eq!(claim.as_deref(), Some("from-header"));
    }

    #[test]
    fn query_beats_body() {
        let claim = extract_church_claim(
            &headers(None),
            Some("page=2&churchId=from-query"),
            br#"{"churchId":"from-body"}"#,
        );
        assert_eq!(claim.as_deref(), Some("from-query"));
    }

    #[test]
    fn repeated_query_parameter_takes_the_first() {
        let claim = extract_church_claim(
            &headers(None),
            Some("churchId=church-shalom&churchId=church-other"),
            b"",
        );
        assert_eq!(claim.as_deref(), Some("church-shalom"));
    }

    #[test]
    fn body_is_last_resort() {
        let claim = extract_church_claim(&headers(None), None, br#"{"name":"x","churchId":"from-body"}"#);
        assert_eq!(claim.as_deref(), Some("from-body"));
    }

    #[test]
    fn empty_values_fall_through() {
        let claim = extract_church_claim(
            &headers(Some("  ")),
            Some("churchId="),
            br#"{"churchId":"from-body"}"#,
        );
        assert_eq!(claim.as_deref(), Some("from-body"));
    }

    #[test]
    fn nothing_usable_yields_none() {
        assert!(extract_church_claim(&headers(None), None, b"").is_none());
        assert!(extract_church_claim(&headers(None), Some("other=1"), b"not json").is_none());
        assert!(extract_church_claim(&headers(None), None, br#"{"churchId":42}"#).is_none());
    }
}
