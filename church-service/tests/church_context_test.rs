mod common;

use common::{json, TestApp, ADMIN_EMAIL, BOB_EMAIL, LEADER_EMAIL};
use serde_json::json;

#[tokio::test]
async fn missing_church_claim_is_a_bad_request_naming_every_source() {
    let app = TestApp::spawn().await;
    let token = app.login(ADMIN_EMAIL).await;

    let response = app.get("/members", &token).send().await.unwrap();
    assert_eq!(response.status(), 400);

    let message = json(response).await["error"].as_str().unwrap().to_string();
    assert!(message.contains("x-church-id"));
    assert!(message.contains("churchId query"));
    assert!(message.contains("churchId body"));
}

#[tokio::test]
async fn primary_church_is_not_used_as_a_silent_default() {
    let app = TestApp::spawn().await;
    let token = app.login(LEADER_EMAIL).await;

    let response = app
        .post("/members", &token)
        .json(&json!({ "firstName": "Ana", "lastName": "Ruiz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn claim_is_accepted_from_header_query_or_body() {
    let app = TestApp::spawn().await;
    let token = app.login(ADMIN_EMAIL).await;

    let via_header = app
        .get("/members/stats", &token)
        .header("x-church-id", "church-shalom")
        .send()
        .await
        .unwrap();
    assert_eq!(via_header.status(), 200);

    let via_query = app
        .get("/members/stats?churchId=church-fuente", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(via_query.status(), 200);

    let via_body = app
        .post("/members", &token)
        .json(&json!({ "churchId": "church-fuente", "firstName": "Ana", "lastName": "Ruiz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(via_body.status(), 201);
    assert_eq!(json(via_body).await["churchId"], "church-fuente");
}

#[tokio::test]
async fn header_takes_priority_over_query_and_body() {
    let app = TestApp::spawn().await;
    let token = app.login(ADMIN_EMAIL).await;

    // The header names an accessible church, the others do not.
    let response = app
        .post("/members?churchId=church-other", &token)
        .header("x-church-id", "church-shalom")
        .json(&json!({ "churchId": "church-other", "firstName": "Eli", "lastName": "Paz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    assert_eq!(json(response).await["churchId"], "church-shalom");

    // The query names an inaccessible church and outranks the body.
    let response = app
        .post("/members?churchId=church-other", &token)
        .json(&json!({ "churchId": "church-shalom", "firstName": "Eli", "lastName": "Paz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn claim_for_an_ungranted_church_is_forbidden() {
    let app = TestApp::spawn().await;
    let token = app.login(ADMIN_EMAIL).await;

    let response = app
        .get("/members", &token)
        .header("x-church-id", "church-other")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn unauthenticated_requests_fail_before_the_church_gate() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/members"))
        .header("x-church-id", "church-shalom")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn revoked_grant_stops_later_requests_only() {
    let app = TestApp::spawn().await;
    let admin = app.login(ADMIN_EMAIL).await;
    let bob = app.login(BOB_EMAIL).await;

    let granted = app
        .post("/users/bob/church-access", &admin)
        .json(&json!({ "churchId": "church-shalom", "role": "USER" }))
        .send()
        .await
        .unwrap();
    assert_eq!(granted.status(), 201);

    let before = app
        .get("/members", &bob)
        .header("x-church-id", "church-shalom")
        .send()
        .await
        .unwrap();
    assert_eq!(before.status(), 200);

    let revoked = app
        .delete("/users/bob/church-access/church-shalom", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(revoked.status(), 200);

    let after = app
        .get("/members", &bob)
        .header("x-church-id", "church-shalom")
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), 403);
    assert_eq!(app.store.grant_row_count("bob", "church-shalom").unwrap(), 1);
}

#[tokio::test]
async fn store_outage_is_not_reported_as_forbidden() {
    let app = TestApp::spawn().await;
    let token = app.login(ADMIN_EMAIL).await;
    app.store.set_unavailable(true);

    let response = app
        .get("/members", &token)
        .header("x-church-id", "church-shalom")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn repeated_church_query_parameter_uses_the_first() {
    let app = TestApp::spawn().await;
    let token = app.login(ADMIN_EMAIL).await;

    let response = app
        .get("/members?churchId=church-shalom&churchId=church-shalom", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .get("/members?churchId=church-shalom&churchId=church-other", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn oversized_body_is_rejected_while_looking_for_the_claim() {
    let app = TestApp::spawn().await;
    let token = app.login(ADMIN_EMAIL).await;

    let notes = "x".repeat(church_service::middleware::church_context::MAX_CLAIM_BODY_BYTES);
    let response = app
        .post("/members", &token)
        .json(&json!({ "churchId": "church-shalom", "firstName": "Ana", "lastName": "Ruiz", "notes": notes }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 413);
}

#[tokio::test]
async fn user_removed_after_login_is_not_found_at_the_gate() {
    let app = TestApp::spawn().await;
    let token = app.login(LEADER_EMAIL).await;
    assert!(app.store.remove_user("leader").unwrap());

    let response = app
        .get("/members", &token)
        .header("x-church-id", "church-fuente")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
