mod common;

use actix_web::test;
use serde_json::json;

use common::{bearer, TestApp};
use japan_itinerary_api::db::repository::UserRepository;
use japan_itinerary_api::models::user::UserRole;

#[actix_rt::test]
async fn test_register_returns_token_and_user() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "Haruka",
            "email": "Haruka@Example.com",
            "password": "password123",
            "password_confirmation": "password123"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["auth_token"].as_str().is_some());
    assert_eq!(body["user"]["email"], "haruka@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());
}

#[actix_rt::test]
async fn test_register_duplicate_email_is_rejected_without_new_row() {
    let test_app = TestApp::new();
    test_app.create_user("taken@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "Someone Else",
            "email": "taken@example.com",
            "password": "password123"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["errors"]["email"].is_array());
    assert_eq!(test_app.store.user_count(), 1);
}

#[actix_rt::test]
async fn test_register_invalid_fields() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "",
            "email": "not-an-email",
            "password": "short"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);

    let body: serde_json::Value = test::read_body_json(resp).await;
    for field in ["name", "email", "password"] {
        assert!(body["errors"][field].is_array(), "missing error for {}", field);
    }
    assert_eq!(test_app.store.user_count(), 0);
}

#[actix_rt::test]
async fn test_register_password_confirmation_mismatch() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "Ren",
            "email": "ren@example.com",
            "password": "password123",
            "password_confirmation": "password124"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    assert_eq!(test_app.store.user_count(), 0);
}

#[actix_rt::test]
async fn test_missing_body_fields_are_validation_errors() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({ "email": "ren@example.com" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
}

#[actix_rt::test]
async fn test_login_success_and_session() {
    let test_app = TestApp::new();
    test_app.create_user("sora@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": "sora@example.com", "password": common::PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["auth_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "sora@example.com");
}

#[actix_rt::test]
async fn test_login_wrong_password_counts_failure() {
    let test_app = TestApp::new();
    let (user_id, _) = test_app.create_user("mio@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "email": "mio@example.com", "password": "wrong-password" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    let user = test_app.store.find_user_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(user.failed_signins, Some(2));
}

#[actix_rt::test]
async fn test_login_unknown_email() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": "nobody@example.com", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_session_without_auth() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/user").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_session_with_garbage_token() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer("not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_logout_revokes_presented_token() {
    let test_app = TestApp::new();
    let (_, token) = test_app.create_user("kaito@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/logout")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // Routes that authenticate through the extractor reject it too.
    let req = test::TestRequest::post()
        .uri("/api/places")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Anywhere" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_health_endpoints() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "OK");

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["services"]["storage"]["status"], "ok");
    // No API key in the test configuration.
    assert_eq!(body["services"]["model"]["status"], "error");
    assert_eq!(body["status"], "degraded");
}

#[actix_rt::test]
async fn test_unknown_api_path_is_not_found() {
    let test_app = TestApp::new();
    let (_, token) = test_app.create_user("visitor@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/no-such-thing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get()
        .uri("/api/no-such-thing")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Route not found");

    // Known protected paths still demand a token.
    let req = test::TestRequest::get().uri("/api/trips").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
