mod common;

use common::{json, TestApp, ADMIN_EMAIL, LEADER_EMAIL};
use serde_json::json;

async fn create_member(app: &TestApp, token: &str, church: &str, first: &str, status: &str) -> String {
    let response = app
        .post("/members", token)
        .header("x-church-id", church)
        .json(&json!({ "firstName": first, "lastName": "Test", "status": status }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn members_are_scoped_to_the_selected_church() {
    let app = TestApp::spawn().await;
    let admin = app.login(ADMIN_EMAIL).await;

    let shalom_member = create_member(&app, &admin, "church-shalom", "Ana", "ACTIVE").await;
    create_member(&app, &admin, "church-fuente", "Luis", "VISITOR").await;

    let listed = json(
        app.get("/members", &admin)
            .header("x-church-id", "church-shalom")
            .send()
            .await
            .unwrap(),
    )
    .await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["firstName"], "Ana");

    // Same id looked up through another church is missing, not forbidden.
    let cross = app
        .get(&format!("/members/{}", shalom_member), &admin)
        .header("x-church-id", "church-fuente")
        .send()
        .await
        .unwrap();
    assert_eq!(cross.status(), 404);
}

#[tokio::test]
async fn member_update_and_delete() {
    let app = TestApp::spawn().await;
    let admin = app.login(ADMIN_EMAIL).await;
    let id = create_member(&app, &admin, "church-shalom", "Ana", "VISITOR").await;

    let updated = app
        .patch(&format!("/members/{}", id), &admin)
        .header("x-church-id", "church-shalom")
        .json(&json!({ "status": "MEMBER", "phone": "555-0101" }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let updated = json(updated).await;
    assert_eq!(updated["status"], "MEMBER");
    assert_eq!(updated["phone"], "555-0101");
    assert_eq!(updated["firstName"], "Ana");

    let deleted = app
        .delete(&format!("/members/{}", id), &admin)
        .header("x-church-id", "church-shalom")
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 204);

    let missing = app
        .get(&format!("/members/{}", id), &admin)
        .header("x-church-id", "church-shalom")
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn stats_count_by_status() {
    let app = TestApp::spawn().await;
    let admin = app.login(ADMIN_EMAIL).await;

    for (name, status) in [
        ("A", "ACTIVE"),
        ("B", "ACTIVE"),
        ("C", "VISITOR"),
        ("D", "MEMBER"),
        ("E", "INACTIVE"),
    ] {
        create_member(&app, &admin, "church-fuente", name, status).await;
    }
    create_member(&app, &admin, "church-shalom", "Z", "ACTIVE").await;

    let stats = json(
        app.get("/members/stats?churchId=church-fuente", &admin)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(
        stats,
        json!({ "total": 5, "active": 2, "visitors": 1, "members": 1, "inactive": 3 })
    );
}

#[tokio::test]
async fn invalid_member_payload_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.login(ADMIN_EMAIL).await;

    let response = app
        .post("/members", &admin)
        .header("x-church-id", "church-shalom")
        .json(&json!({ "firstName": "", "lastName": "Test", "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn users_are_listed_and_created_within_the_selected_church() {
    let app = TestApp::spawn().await;
    let admin = app.login(ADMIN_EMAIL).await;

    let created = app
        .post("/users", &admin)
        .header("x-church-id", "church-fuente")
        .json(&json!({
            "email": "nuevo@iglesia.org",
            "password": "secret1",
            "firstName": "Nuevo",
            "lastName": "Miembro"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let created = json(created).await;
    assert_eq!(created["role"], "USER");
    assert_eq!(created["churchId"], "church-fuente");
    assert_eq!(created["organizationId"], "org-central");
    assert!(created.get("passwordHash").is_none());

    let listed = json(
        app.get("/users", &admin)
            .header("x-church-id", "church-fuente")
            .send()
            .await
            .unwrap(),
    )
    .await;
    let emails: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert!(emails.contains(&"nuevo@iglesia.org"));
    assert!(emails.contains(&LEADER_EMAIL));

    let duplicate = app
        .post("/users", &admin)
        .header("x-church-id", "church-fuente")
        .json(&json!({
            "email": "nuevo@iglesia.org",
            "password": "secret1",
            "firstName": "Otro",
            "lastName": "Miembro"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), 409);
}

#[tokio::test]
async fn only_admins_create_users() {
    let app = TestApp::spawn().await;
    let leader = app.login(LEADER_EMAIL).await;

    let response = app
        .post("/users", &leader)
        .header("x-church-id", "church-fuente")
        .json(&json!({
            "email": "x@iglesia.org",
            "password": "secret1",
            "firstName": "X",
            "lastName": "Y"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}
