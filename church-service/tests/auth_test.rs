mod common;

use common::{json, TestApp, ADMIN_EMAIL, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn login_returns_bearer_token_and_sanitized_user() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = json(response).await;
    assert_eq!(body["tokenType"], "Bearer");
    assert!(body["expiresIn"].as_i64().unwrap() > 0);
    assert_eq!(body["user"]["churchId"], "church-shalom");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": "not-an-email", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn me_and_refresh_use_the_stored_record() {
    let app = TestApp::spawn().await;
    let token = app.login(ADMIN_EMAIL).await;

    let me = json(app.get("/auth/me", &token).send().await.unwrap()).await;
    assert_eq!(me["email"], ADMIN_EMAIL);
    assert_eq!(me["role"], "ADMIN");

    let refreshed = app.post("/auth/refresh", &token).send().await.unwrap();
    assert_eq!(refreshed.status(), 200);
    assert!(json(refreshed).await["accessToken"].is_string());

    app.store.set_user_active("admin", false).unwrap();
    let refused = app.post("/auth/refresh", &token).send().await.unwrap();
    assert_eq!(refused.status(), 401);
}
