mod common;

use common::*;
use serde_json::json;

use axum::http::StatusCode;
use uuid::Uuid;

async fn authed_app() -> (TestApp, String) {
    let app = spawn_app();
    let admin = app.seed_user("ADMIN_001", "admin@example.com").await;
    let token = app.access_token_for(&admin);
    (app, token)
}

#[tokio::test]
async fn create_user_returns_a_sanitized_201() {
    let (app, token) = authed_app().await;

    let (status, body) = app
        .send(json_req_auth(
            "POST",
            "/api/v1/users",
            &token,
            json!({
                "userId": "USER_20250815001",
                "name": "Kyaw Soe",
                "email": "kyawsoe@example.com",
                "password": TEST_PASSWORD,
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["statusCode"], json!(201));
    assert_eq!(body["message"], json!("User created"));
    assert_eq!(body["data"]["userId"], json!("USER_20250815001"));
    assert_eq!(body["data"]["name"], json!("Kyaw Soe"));
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_user_id_conflicts() {
    let (app, token) = authed_app().await;

    let payload = json!({
        "userId": "USER_20250815001",
        "email": "kyawsoe@example.com",
        "password": TEST_PASSWORD,
    });
    let (status, _) = app
        .send(json_req_auth("POST", "/api/v1/users", &token, payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut second = payload;
    second["email"] = json!("different@example.com");
    let (status, body) = app
        .send(json_req_auth("POST", "/api/v1/users", &token, second))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], json!(false));
    assert_eq!(body["messageCode"], json!("INVALID"));
    assert_eq!(
        body["message"],
        json!("Duplicate entry: userId already exists.")
    );
}

#[tokio::test]
async fn invalid_create_payload_reports_fields() {
    let (app, token) = authed_app().await;

    let (status, body) = app
        .send(json_req_auth(
            "POST",
            "/api/v1/users",
            &token,
            json!({"userId": "U1", "email": "not-an-email", "password": "short"}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["messageCode"], json!("INVALID"));
    assert_eq!(
        body["validationErrors"]["email"],
        json!(["Invalid email format"])
    );
    assert_eq!(
        body["validationErrors"]["password"],
        json!(["Password must be at least 8 characters"])
    );
}

#[tokio::test]
async fn me_returns_the_authenticated_caller() {
    let (app, token) = authed_app().await;

    let (status, body) = app.send(get_req_auth("/api/v1/users/me", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userId"], json!("ADMIN_001"));
    assert_eq!(body["data"]["email"], json!("admin@example.com"));
}

#[tokio::test]
async fn get_user_by_id_and_missing_user() {
    let (app, token) = authed_app().await;
    let user = app.seed_user("USER_20250815001", "kyawsoe@example.com").await;

    let (status, body) = app
        .send(get_req_auth(&format!("/api/v1/users/{}", user.id), &token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], json!("kyawsoe@example.com"));

    let (status, body) = app
        .send(get_req_auth(
            &format!("/api/v1/users/{}", Uuid::new_v4()),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], json!(false));
    assert_eq!(body["message"], json!("User not found"));
}

#[tokio::test]
async fn update_patches_only_supplied_fields() {
    let (app, token) = authed_app().await;
    let user = app.seed_user("USER_20250815001", "kyawsoe@example.com").await;

    let (status, body) = app
        .send(json_req_auth(
            "PUT",
            &format!("/api/v1/users/{}", user.id),
            &token,
            json!({"name": "Renamed"}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], json!("Renamed"));
    assert_eq!(body["data"]["email"], json!("kyawsoe@example.com"));

    // password untouched: the original one still logs in
    let (status, _) = app
        .send(json_req(
            "POST",
            "/api/v1/login",
            json!({"userId": "USER_20250815001", "password": TEST_PASSWORD}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_password_changes_credentials() {
    let (app, token) = authed_app().await;
    let user = app.seed_user("USER_20250815001", "kyawsoe@example.com").await;

    let (status, _) = app
        .send(json_req_auth(
            "PUT",
            &format!("/api/v1/users/{}", user.id),
            &token,
            json!({"password": "NewPassword@456"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(json_req(
            "POST",
            "/api/v1/login",
            json!({"userId": "USER_20250815001", "password": TEST_PASSWORD}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(json_req(
            "POST",
            "/api/v1/login",
            json!({"userId": "USER_20250815001", "password": "NewPassword@456"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_user_then_404() {
    let (app, token) = authed_app().await;
    let user = app.seed_user("USER_20250815001", "kyawsoe@example.com").await;
    let uri = format!("/api/v1/users/{}", user.id);

    let delete = || {
        json_req_auth("DELETE", &uri, &token, json!({}))
    };

    let (status, body) = app.send(delete()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"deleted": true}));

    let (status, body) = app.send(delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("User not found"));
}
