mod common;

use actix_web::test;
use serde_json::json;

use common::{bearer, kyoto_preferences, ScriptedModel, TestApp};
use japan_itinerary_api::db::repository::{AiLogRepository, ItineraryRepository};
use japan_itinerary_api::models::user::UserRole;
use japan_itinerary_api::services::chat_adjustment_service::FALLBACK_REPLY;

#[actix_rt::test]
async fn test_generate_itinerary_anonymously() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-japan-itinerary")
        .set_json(kyoto_preferences())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["region"], "Kyoto");
    assert_eq!(days[0]["total_cost"], 29800.0);
    assert_eq!(days[1]["total_cost"], 23500.0);
    assert_eq!(body["total_cost"], 53300.0);

    let prompts = test_app.model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Kyoto"));
}

#[actix_rt::test]
async fn test_generate_rejects_empty_regions() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-japan-itinerary")
        .set_json(json!({ "regions": [], "travelStyles": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    assert!(test_app.model.prompts().is_empty());
}

#[actix_rt::test]
async fn test_model_failure_is_bad_gateway() {
    let test_app = TestApp::with_model(ScriptedModel::failing());
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-japan-itinerary")
        .set_json(kyoto_preferences())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 502);
}

#[actix_rt::test]
async fn test_unparseable_model_output_is_bad_gateway() {
    let test_app = TestApp::with_model(ScriptedModel::replying("{\"plan\": []}"));
    let (user_id, token) = test_app.create_user("yuki@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-japan-itinerary")
        .insert_header(bearer(&token))
        .set_json(kyoto_preferences())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 502);

    let logs = test_app.store.list_interactions(user_id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].success);
    assert!(test_app.store.list_itineraries(user_id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_generate_for_user_persists_in_background() {
    let test_app = TestApp::new();
    let (user_id, token) = test_app.create_user("yuki@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-japan-itinerary")
        .insert_header(bearer(&token))
        .set_json(kyoto_preferences())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let mut stored = Vec::new();
    for _ in 0..50 {
        actix_rt::task::yield_now().await;
        stored = test_app.store.list_itineraries(user_id).await.unwrap();
        if !stored.is_empty() {
            break;
        }
    }
    assert_eq!(stored.len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/itineraries/{}", stored[0].id.unwrap().to_hex()))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["days"].as_array().unwrap().len(), 2);
    assert_eq!(body["days"][0]["stops"][0]["place_name"], "Kiyomizu-dera");
    assert_eq!(body["total_cost"], 53300.0);
}

#[actix_rt::test]
async fn test_adjust_with_matching_rule_regenerates() {
    let test_app = TestApp::new();
    let (user_id, token) = test_app.create_user("aoi@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/ai/adjust-itinerary")
        .insert_header(bearer(&token))
        .set_json(json!({
            "message": "もう少しのんびりしたいです",
            "preferences": kyoto_preferences()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["rule"], "relaxed_pace");
    assert_eq!(body["timeline"]["days"].as_array().unwrap().len(), 2);

    let prompts = test_app.model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("relaxed"));

    let suggestions = test_app.store.list_suggestions(user_id).await.unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].rule, "relaxed_pace");
}

#[actix_rt::test]
async fn test_adjust_without_match_skips_model() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/ai/adjust-itinerary")
        .set_json(json!({
            "message": "こんにちは",
            "preferences": kyoto_preferences()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["reply"], FALLBACK_REPLY);
    assert!(body["rule"].is_null());
    assert!(body["timeline"].is_null());
    assert!(test_app.model.prompts().is_empty());
}

#[actix_rt::test]
async fn test_save_itinerary_and_cascade_delete() {
    let test_app = TestApp::new();
    let (_, token) = test_app.create_user("saver@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/ai/save-itinerary")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Kyoto weekend",
            "start_date": "2025-11-22",
            "preferences": kyoto_preferences(),
            "timeline": {
                "days": [{
                    "day": 1,
                    "region": "Kyoto",
                    "title": "Temples",
                    "activities": [
                        { "time": "09:00", "type": "attraction", "name": "Tofuku-ji", "cost": 1000 },
                        { "time": "12:00", "type": "meal", "name": "Menbakaichidai", "cost": 1500 }
                    ]
                }]
            }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Kyoto weekend");
    assert_eq!(body["end_date"], "2025-11-22");
    assert_eq!(body["total_cost"], 2500.0);
    let stops = body["days"][0]["stops"].as_array().unwrap();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0]["end_time"], "12:00");
    let id = body["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/itineraries")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let list: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/itineraries/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let oid = mongodb::bson::oid::ObjectId::parse_str(&id).unwrap();
    assert!(test_app.store.itinerary_places(oid).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_itineraries_of_other_users_are_hidden() {
    let test_app = TestApp::new();
    let (_, owner) = test_app.create_user("owner@example.com", UserRole::User).await;
    let (_, other) = test_app.create_user("other@example.com", UserRole::User).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/ai/save-itinerary")
        .insert_header(bearer(&owner))
        .set_json(json!({
            "timeline": {
                "days": [{
                    "day": 1,
                    "region": "Nara",
                    "activities": [
                        { "time": "09:00", "type": "attraction", "name": "Todai-ji", "cost": 800 }
                    ]
                }]
            }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let id = body["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/itineraries/{}", id))
        .insert_header(bearer(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/itineraries/{}", id))
        .insert_header(bearer(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get()
        .uri("/api/itineraries")
        .insert_header(bearer(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let list: serde_json::Value = test::read_body_json(resp).await;
    assert!(list.as_array().unwrap().is_empty());

    let oid = mongodb::bson::oid::ObjectId::parse_str(&id).unwrap();
    assert!(test_app.store.find_itinerary(oid).await.unwrap().is_some());
    assert_eq!(test_app.store.itinerary_places(oid).await.unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/itineraries/{}", id))
        .insert_header(bearer(&owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_save_itinerary_requires_auth() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/ai/save-itinerary")
        .set_json(json!({ "timeline": { "days": [] } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_chat_log_is_private() {
    let test_app = TestApp::new();
    let (user_id, token) = test_app.create_user("owner@example.com", UserRole::User).await;
    let (_, other) = test_app.create_user("other@example.com", UserRole::User).await;
    let (_, admin) = test_app.create_user("admin@example.com", UserRole::Admin).await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/ai/adjust-itinerary")
        .insert_header(bearer(&token))
        .set_json(json!({ "message": "雨の日プランにして", "preferences": kyoto_preferences() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let uri = format!("/api/ai/chat/log/{}", user_id.to_hex());

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    for viewer in [&token, &admin] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(viewer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["interactions"].as_array().unwrap().len(), 1);
        assert_eq!(body["interactions"][0]["kind"], "adjust");
        assert_eq!(body["suggestions"][0]["rule"], "rainy_day");
    }
}
