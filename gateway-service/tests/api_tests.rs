mod common;

use common::grant;
use common::TestApp;
use common::ADMIN_EMAIL;
use common::ADMIN_PASSWORD;
use common::GATEWAY_SERVICE;
use reqwest::StatusCode;
use serde_json::json;

fn new_user_body(email: &str) -> serde_json::Value {
    json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": email,
        "password": "C0bolRules",
        "token_lifetime_hours": 2
    })
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let token = body["data"]["token"].as_str().unwrap();
    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": "Wr0ngPassword" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_inactive_identity() {
    let app = TestApp::spawn().await;
    app.directory.set_identity_active(app.admin.id, false);

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_user_success() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users")
        .json(&new_user_body("grace@example.com"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["email"], "grace@example.com");
    assert_eq!(body["data"]["token_lifetime_hours"], 2);
    assert_eq!(body["data"]["active"], true);
    assert!(body["data"]["identifier"].is_string());
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("private_key").is_none());

    // New users can log in but hold no grants
    let token = app.login("grace@example.com", "C0bolRules").await;
    let response = app
        .get_authenticated("/api/users/me", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users")
        .json(&new_user_body(ADMIN_EMAIL))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn test_create_user_validation() {
    let app = TestApp::spawn().await;

    let cases = [
        ("password", json!("alllowercase1")),
        ("email", json!("not-an-email")),
        ("first_name", json!("R2D2")),
        ("token_lifetime_hours", json!(0)),
    ];

    for (field, value) in cases {
        let mut body = new_user_body("valid@example.com");
        body[field] = value;

        let response = app
            .post("/api/users")
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "field {}",
            field
        );
    }
}

#[tokio::test]
async fn test_current_user() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .get_authenticated("/api/users/me", &token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["id"], app.admin.id);
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    assert_eq!(body["data"]["service_grants"][0]["name"], GATEWAY_SERVICE);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/users/me")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .get_authenticated("/api/users/1", "not-a-token")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_user_requires_permission() {
    let app = TestApp::spawn().await;
    let gateway_id = app.directory.service_identifier(GATEWAY_SERVICE).unwrap();
    let reader = app.directory.seed_identity(
        "reader@example.com",
        "Re4derPassword",
        vec![grant(GATEWAY_SERVICE, gateway_id, &[("read-user", false)])],
    );

    let token = app.login("reader@example.com", "Re4derPassword").await;

    // Service access alone is enough for the caller's own identity
    let response = app
        .get_authenticated("/api/users/me", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get_authenticated(&format!("/api/users/{}", app.admin.id), &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_token = app.admin_token().await;
    let response = app
        .get_authenticated(&format!("/api/users/{}", reader.id), &admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["email"], "reader@example.com");
}

#[tokio::test]
async fn test_get_user_not_found() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .get_authenticated("/api/users/999", &token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_user_replaces_grants() {
    let app = TestApp::spawn().await;
    let orders_id = app
        .directory
        .seed_service("orders", "127.0.0.1", 9000, &["read", "write"]);
    let user = app
        .directory
        .seed_identity("ops@example.com", "0psPassword", Vec::new());
    let token = app.admin_token().await;

    let response = app
        .put_authenticated(&format!("/api/users/{}", user.id), &token)
        .json(&json!({
            "first_name": "Ops",
            "last_name": "Team",
            "email": "ops@example.com",
            "active": true,
            "token_lifetime_hours": 4,
            "service_grants": [{
                "name": "orders",
                "identifier": orders_id,
                "has_access": true,
                "permissions": [
                    { "name": "read", "has_access": true },
                    { "name": "write", "has_access": false }
                ]
            }]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .get_authenticated(&format!("/api/users/{}", user.id), &token)
        .send()
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");

    assert_eq!(body["data"]["first_name"], "Ops");
    assert_eq!(body["data"]["token_lifetime_hours"], 4);
    assert_eq!(body["data"]["service_grants"][0]["name"], "orders");
    assert_eq!(
        body["data"]["service_grants"][0]["permissions"][1]["has_access"],
        false
    );
}

#[tokio::test]
async fn test_update_user_rejects_duplicate_grants() {
    let app = TestApp::spawn().await;
    let orders_id = app
        .directory
        .seed_service("orders", "127.0.0.1", 9000, &["read"]);
    let token = app.admin_token().await;

    let grant = json!({
        "name": "orders",
        "identifier": orders_id,
        "has_access": true,
        "permissions": []
    });

    let response = app
        .put_authenticated(&format!("/api/users/{}", app.admin.id), &token)
        .json(&json!({
            "first_name": "Admin",
            "last_name": "User",
            "email": ADMIN_EMAIL,
            "active": true,
            "token_lifetime_hours": 8,
            "service_grants": [grant.clone(), grant]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_reset_password_invalidates_previous_tokens() {
    let app = TestApp::spawn().await;
    let gateway_id = app.directory.service_identifier(GATEWAY_SERVICE).unwrap();
    let user = app.directory.seed_identity(
        "reset@example.com",
        "0ldPassword",
        vec![grant(GATEWAY_SERVICE, gateway_id, &[])],
    );
    let old_token = app.login("reset@example.com", "0ldPassword").await;
    let admin_token = app.admin_token().await;

    let response = app
        .post_authenticated(
            &format!("/api/users/{}/reset-password", user.id),
            &admin_token,
        )
        .json(&json!({ "password": "N3wPassword" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["password"], "N3wPassword");

    // Keys were regenerated, so the old signature no longer verifies
    let response = app
        .get_authenticated("/api/users/me", &old_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let new_token = app.login("reset@example.com", "N3wPassword").await;
    let response = app
        .get_authenticated("/api/users/me", &new_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reset_password_generates_password() {
    let app = TestApp::spawn().await;
    let user = app
        .directory
        .seed_identity("gen@example.com", "0ldPassword", Vec::new());
    let admin_token = app.admin_token().await;

    let response = app
        .post_authenticated(
            &format!("/api/users/{}/reset-password", user.id),
            &admin_token,
        )
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let password = body["data"]["password"].as_str().unwrap().to_string();
    assert_eq!(password.len(), 16);

    app.login("gen@example.com", &password).await;
}

#[tokio::test]
async fn test_register_and_list_services() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .post_authenticated("/api/services", &token)
        .json(&json!({
            "name": "billing",
            "description": "Invoices",
            "host": "billing.internal",
            "port": 8443,
            "permissions": ["read", "refund"]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["name"], "billing");
    assert_eq!(body["data"]["permissions"], json!(["read", "refund"]));
    assert!(body["data"].get("private_key").is_none());

    let response = app
        .get_authenticated("/api/services", &token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"billing"));
    assert!(names.contains(&GATEWAY_SERVICE));
}

#[tokio::test]
async fn test_register_service_validation() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .post_authenticated("/api/services", &token)
        .json(&json!({ "name": "bad/name", "host": "h", "port": 80 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post_authenticated("/api/services", &token)
        .json(&json!({ "name": "ports", "host": "h", "port": 70000 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post_authenticated("/api/services", &token)
        .json(&json!({ "name": GATEWAY_SERVICE, "host": "h", "port": 80 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_service() {
    let app = TestApp::spawn().await;
    let orders_id = app
        .directory
        .seed_service("orders", "127.0.0.1", 9000, &["read"]);
    let token = app.admin_token().await;

    let response = app
        .put_authenticated(&format!("/api/services/{}", orders_id), &token)
        .json(&json!({
            "description": "Moved",
            "host": "orders.internal",
            "port": 9100,
            "active": false
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .put_authenticated("/api/services/not-a-uuid", &token)
        .json(&json!({ "host": "h", "port": 1, "active": true }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .put_authenticated(&format!("/api/services/{}", uuid::Uuid::new_v4()), &token)
        .json(&json!({ "host": "h", "port": 1, "active": true }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
