//! Shared setup for church-service integration tests.
//!
//! Spawns the real router on an ephemeral port, backed by a seeded
//! `InMemoryStore`, so no database is needed.

#![allow(dead_code)]

use chrono::Utc;
use church_service::{
    config::ChurchConfig,
    models::{NewUser, UserRole},
    services::{CredentialStore, InMemoryStore},
    startup::Application,
    utils::{hash_password, Password},
    AppState,
};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

pub const PASSWORD: &str = "password123";
pub const ADMIN_EMAIL: &str = "admin@iglesia.org";
pub const BOB_EMAIL: &str = "bob@iglesia.org";
pub const LEADER_EMAIL: &str = "leader@iglesia.org";

static PASSWORD_HASH: OnceLock<String> = OnceLock::new();

fn password_hash() -> String {
    PASSWORD_HASH
        .get_or_init(|| hash_password(&Password::new(PASSWORD)).expect("hash"))
        .clone()
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    /// Spawn with extra environment overrides (e.g. `TENANT_DENY_INACTIVE_USERS`).
    pub async fn spawn_with(overrides: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = [
            ("DATABASE_URL", "postgres://unused/church"),
            ("JWT_SECRET", "integration-test-secret-0123456789"),
            ("ALLOWED_ORIGINS", "http://localhost:5173"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            vars.insert(k.to_string(), v.to_string());
        }

        let common = service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let config =
            ChurchConfig::from_lookup(common, |k| vars.get(k).cloned()).expect("config");

        let store = Arc::new(InMemoryStore::new());
        seed(&store).await;

        let state = AppState::new(config, store.clone(), store.clone());
        let app = Application::with_state(state).await.expect("bind");
        let address = format!("http://127.0.0.1:{}", app.port());
        tokio::spawn(app.run_until(std::future::pending()));

        Self {
            address,
            store,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("login request");
        assert_eq!(response.status(), 200, "login failed for {}", email);
        let body: Value = response.json().await.expect("login body");
        body["accessToken"]
            .as_str()
            .expect("accessToken")
            .to_string()
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn patch(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }
}

pub async fn json(response: Response) -> Value {
    response.json().await.expect("json body")
}

/// Two organizations, three churches and three users:
/// - `admin` (ADMIN): primary `church-shalom`, LEADER grant on `church-fuente`
/// - `leader` (LEADER): primary `church-fuente`
/// - `bob` (USER): no primary church, no grants
async fn seed(store: &InMemoryStore) {
    store.add_organization("org-central", "Ministerio Central").unwrap();
    store.add_organization("org-norte", "Ministerio Norte").unwrap();
    store.add_church("church-shalom", "org-central", "Iglesia Shalom").unwrap();
    store.add_church("church-fuente", "org-central", "Iglesia Fuente de Vida").unwrap();
    store.add_church("church-other", "org-norte", "Iglesia del Norte").unwrap();

    let users = [
        ("admin", ADMIN_EMAIL, UserRole::Admin, Some(("org-central", "church-shalom"))),
        ("leader", LEADER_EMAIL, UserRole::Leader, Some(("org-central", "church-fuente"))),
        ("bob", BOB_EMAIL, UserRole::User, None),
    ];

    for (id, email, role, primary) in users {
        let mut new_user = NewUser::new(
            email.to_string(),
            password_hash(),
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
    }

    store
        .upsert_grant("admin", "church-fuente", "LEADER", None, Utc::now())
        .await
        .unwrap();
}
