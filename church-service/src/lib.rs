pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{ChurchConfig, Environment};
use crate::dtos::HealthResponse;
use crate::middleware::church_context::CHURCH_ID_HEADER;
use crate::services::{
    AccessPolicy, AuthService, ChurchAccessService, ChurchService, CredentialStore, JwtService,
    MemberStore, TenantAccessResolver,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::login,
        handlers::auth::me,
        handlers::auth::refresh,
        handlers::users::available_churches,
        handlers::users::my_churches,
        handlers::users::select_church,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::church_access::list_grants,
        handlers::church_access::grant_access,
        handlers::church_access::revoke_access,
        handlers::churches::list_organizations,
        handlers::churches::create_organization,
        handlers::churches::list_churches,
        handlers::churches::create_church,
        handlers::members::list_members,
        handlers::members::create_member,
        handlers::members::member_stats,
        handlers::members::get_member,
        handlers::members::update_member,
        handlers::members::delete_member,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::HealthResponse,
            dtos::auth::LoginRequest,
            dtos::auth::TokenResponse,
            dtos::users::SelectChurchRequest,
            dtos::users::AvailableChurchesResponse,
            dtos::users::CreateUserRequest,
            dtos::users::UpdateUserRequest,
            dtos::church_access::GrantChurchAccessRequest,
            dtos::church_access::ChurchAccessResponse,
            dtos::churches::CreateOrganizationRequest,
            dtos::churches::CreateChurchRequest,
            dtos::churches::ChurchResponse,
            dtos::members::CreateMemberRequest,
            dtos::members::UpdateMemberRequest,
            models::SanitizedUser,
            models::UserRole,
            models::Organization,
            models::Church,
            models::OrganizationSummary,
            models::ResolvedChurchView,
            models::ChurchSelection,
            models::GrantState,
            models::GrantEvent,
            models::Member,
            models::MemberStatus,
            models::MemberStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and token management"),
        (name = "Tenant", description = "Church availability and selection"),
        (name = "Users", description = "Users of the selected church"),
        (name = "Church Access", description = "Secondary church grants (admin)"),
        (name = "Churches", description = "Organizations and churches"),
        (name = "Members", description = "Members of the selected church"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ChurchConfig,
    pub store: Arc<dyn CredentialStore>,
    pub members: Arc<dyn MemberStore>,
    pub jwt: JwtService,
    pub resolver: TenantAccessResolver,
    pub auth_service: AuthService,
    pub church_access: ChurchAccessService,
    pub churches: ChurchService,
}

impl AppState {
    pub fn new(
        config: ChurchConfig,
        store: Arc<dyn CredentialStore>,
        members: Arc<dyn MemberStore>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let resolver = TenantAccessResolver::new(
            store.clone(),
            AccessPolicy {
                deny_inactive_users: config.tenant.deny_inactive_users,
            },
        );
        let auth_service = AuthService::new(store.clone(), jwt.clone());
        let church_access = ChurchAccessService::new(store.clone(), resolver.clone());
        let churches = ChurchService::new(store.clone(), resolver.clone(), church_access.clone());

        Self {
            config,
            store,
            members,
            jwt,
            resolver,
            auth_service,
            church_access,
            churches,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Authenticated, not tenant-scoped
    let account_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/users/available-churches",
            get(handlers::users::available_churches),
        )
        .route("/users/my-churches", get(handlers::users::my_churches))
        .route("/users/select-church", post(handlers::users::select_church))
        .route(
            "/users/:id/church-access",
            get(handlers::church_access::list_grants).post(handlers::church_access::grant_access),
        )
        .route(
            "/users/:id/church-access/:church_id",
            delete(handlers::church_access::revoke_access),
        )
        .route(
            "/organizations",
            get(handlers::churches::list_organizations).post(handlers::churches::create_organization),
        )
        .route(
            "/churches",
            get(handlers::churches::list_churches).post(handlers::churches::create_church),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // Tenant-scoped: auth runs first, then the church context gate
    let church_routes = Router::new()
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/members",
            get(handlers::members::list_members).post(handlers::members::create_member),
        )
        .route("/members/stats", get(handlers::members::member_stats))
        .route(
            "/members/:id",
            get(handlers::members::get_member)
                .patch(handlers::members::update_member)
                .delete(handlers::members::delete_member),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::church_context_middleware,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/auth/login", post(handlers::auth::login));

    if state.config.environment == Environment::Dev {
        app = app.merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));
    }

    let origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    // Inside routing so MatchedPath is populated
    app.merge(account_routes)
        .merge(church_routes)
        .route_layer(from_fn(metrics_middleware))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static(CHURCH_ID_HEADER),
                    HeaderName::from_static(REQUEST_ID_HEADER),
                ]),
        )
}

/// Service health check; pings the credential store.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Credential store unreachable", body = HealthResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, label) = match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            tracing::error!(error = %e, "Credential store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            service: state.config.service_name.clone(),
            version: state.config.service_version.clone(),
        }),
    )
}

async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        service_core::observability::render_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryStore;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router() -> Router {
        let common = service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let config = ChurchConfig::from_lookup(common, |key| match key {
            "DATABASE_URL" => Some("postgres://unused/church".to_string()),
            "JWT_SECRET" => Some("router-test-secret-0123456789abcdef".to_string()),
            _ => None,
        })
        .unwrap();
        let store = Arc::new(InMemoryStore::new());
        build_router(AppState::new(config, store.clone(), store))
    }

    #[tokio::test]
    async fn openapi_document_lists_tenant_routes() {
        let response = router()
            .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/users/select-church"].is_object());
        assert!(doc["paths"]["/users/available-churches"].is_object());
        assert!(doc["paths"]["/users/{id}"]["patch"].is_object());
        assert!(doc["paths"]["/churches"]["post"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
    }

    #[tokio::test]
    async fn church_routes_require_a_token_before_the_church_gate() {
        let response = router()
            .oneshot(Request::get("/members").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cors_allows_the_church_header() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/members")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, CHURCH_ID_HEADER)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        assert!(allowed.contains(CHURCH_ID_HEADER));
    }
}
