mod common;

use std::io::Write;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use chrono::{Duration, Utc};
use common::{bearer, no_gateway, quiet_mailer, state, state_with, user};
use pw_api::{configure_routes, ApiConfig};
use pw_core::models::{FriendRequest, FriendRequestStatus};
use pw_core::traits::{SocialRepo, UserRepo};
use serde_json::{json, Value};
use uuid::Uuid;

#[actix_web::test]
async fn admin_routes_require_a_stored_admin_flag() {
    let state = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (_, member) = user(&state, "rex", false).await;
    let (_, admin) = user(&state, "boss", true).await;

    let req = test::TestRequest::get().uri("/api/admin/stats").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/admin/stats")
        .insert_header(bearer(&member))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get()
        .uri("/api/admin/stats")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["users"], 2);
    assert_eq!(body["data"]["admins"], 1);
}

#[actix_web::test]
async fn pro_flags_can_be_patched_and_expired() {
    let state = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (_, admin) = user(&state, "boss", true).await;
    let (rex, _) = user(&state, "rex", false).await;
    let (luna, _) = user(&state, "luna", false).await;

    let patch = |id: Uuid, body: Value| {
        test::TestRequest::patch()
            .uri(&format!("/api/admin/users/{id}/pro"))
            .insert_header(bearer(&admin))
            .set_json(body)
            .to_request()
    };

    // rex: Pro that already lapsed; luna: open-ended Pro
    let lapsed = Utc::now() - Duration::days(1);
    let body: Value =
        test::call_and_read_body_json(&app, patch(rex.id, json!({ "isPro": true, "proExpiry": lapsed })))
            .await;
    assert_eq!(body["data"]["isPro"], true);
    let body: Value =
        test::call_and_read_body_json(&app, patch(luna.id, json!({ "isPro": true, "proExpiry": null })))
            .await;
    assert!(body["data"]["proExpiry"].is_null());

    let req = test::TestRequest::post()
        .uri("/api/admin/pro/enforce-expiry")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["modified"], 1);
    assert!(!state.repo.get_user(rex.id).await.unwrap().unwrap().is_pro);
    assert!(state.repo.get_user(luna.id).await.unwrap().unwrap().is_pro);

    // Revoking clears the expiry even if one is sent
    let future = Utc::now() + Duration::days(30);
    let body: Value =
        test::call_and_read_body_json(&app, patch(luna.id, json!({ "isPro": false, "proExpiry": future })))
            .await;
    assert_eq!(body["data"]["isPro"], false);
    assert!(body["data"]["proExpiry"].is_null());

    let resp = test::call_service(&app, patch(Uuid::now_v7(), json!({ "isPro": true }))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn moderation_of_threads_and_reports() {
    let state = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (boss, admin) = user(&state, "boss", true).await;
    let (_, rex) = user(&state, "rex", false).await;
    let (_, luna) = user(&state, "luna", false).await;

    let req = test::TestRequest::post()
        .uri("/api/threads")
        .insert_header(bearer(&rex))
        .set_json(json!({ "content": "buy cheap bones #spam" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let thread_id = body["data"]["id"].as_str().unwrap().to_string();

    // Reporters cannot report their own content
    let report = |token: &str| {
        test::TestRequest::post()
            .uri("/api/reports")
            .insert_header(bearer(token))
            .set_json(json!({ "targetType": "thread", "targetId": thread_id, "reason": "spam" }))
            .to_request()
    };
    assert_eq!(test::call_service(&app, report(&rex)).await.status(), StatusCode::BAD_REQUEST);
    let resp = test::call_service(&app, report(&luna)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let report_id = body["data"]["id"].as_str().unwrap().to_string();

    // Admin finds it among open reports and resolves it
    let req = test::TestRequest::get()
        .uri("/api/admin/reports?status=OPEN")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["id"], report_id.as_str());

    let req = test::TestRequest::patch()
        .uri(&format!("/api/admin/reports/{report_id}"))
        .insert_header(bearer(&admin))
        .set_json(json!({ "status": "RESOLVED", "notes": "removed" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "RESOLVED");
    let history = body["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["action"], "RESOLVED");
    assert_eq!(history[1]["actor"], boss.id.to_string());

    let req = test::TestRequest::patch()
        .uri(&format!("/api/admin/reports/{report_id}"))
        .insert_header(bearer(&admin))
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // Search, then delete someone else's thread
    let req = test::TestRequest::get()
        .uri("/api/admin/threads?q=REX")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/admin/threads/{thread_id}"))
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/admin/users?q=lun")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["username"], "luna");
}

#[actix_web::test]
async fn admin_can_accept_any_pending_request() {
    let state = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (_, admin) = user(&state, "boss", true).await;
    let (rex, _) = user(&state, "rex", false).await;
    let (luna, _) = user(&state, "luna", false).await;

    let request = FriendRequest {
        id: Uuid::now_v7(),
        from_user_id: rex.id,
        to_user_id: luna.id,
        status: FriendRequestStatus::Pending,
        created_at: Utc::now(),
        responded_at: None,
    };
    state.repo.create_friend_request(request.clone()).await.unwrap();

    let accept = || {
        test::TestRequest::post()
            .uri(&format!("/api/admin/friend-requests/{}/accept", request.id))
            .insert_header(bearer(&admin))
            .to_request()
    };
    assert_eq!(test::call_service(&app, accept()).await.status(), StatusCode::OK);
    assert!(state.repo.are_friends(luna.id, rex.id).await.unwrap());
    assert_eq!(test::call_service(&app, accept()).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn log_viewer_tails_the_configured_file() {
    let unconfigured = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(
        App::new()
            .app_data(unconfigured.clone())
            .configure(configure_routes),
    )
    .await;
    let (_, admin) = user(&unconfigured, "boss", true).await;
    let req = test::TestRequest::get()
        .uri("/api/admin/logs")
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let path = std::env::temp_dir().join(format!("pawster-admin-{}.log", Uuid::new_v4()));
    let mut file = std::fs::File::create(&path).unwrap();
    for i in 1..=10 {
        writeln!(file, "[INFO] entry {i}").unwrap();
    }
    drop(file);

    let config = ApiConfig {
        log_file: Some(path.clone()),
        ..ApiConfig::default()
    };
    let state = state_with(quiet_mailer(), no_gateway(), config).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (_, admin) = user(&state, "boss", true).await;

    let req = test::TestRequest::get()
        .uri("/api/admin/logs?lines=3")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body["data"]["lines"],
        json!(["[INFO] entry 8", "[INFO] entry 9", "[INFO] entry 10"])
    );

    std::fs::remove_file(&path).unwrap();
}
