mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use common::{bearer, no_gateway, quiet_mailer, state, user};
use pw_api::configure_routes;
use serde_json::{json, Value};

#[actix_web::test]
async fn thread_lifecycle() {
    let state = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (_, rex) = user(&state, "rex", false).await;
    let (_, luna) = user(&state, "luna", false).await;

    // Create
    let req = test::TestRequest::post()
        .uri("/api/threads")
        .insert_header(bearer(&rex))
        .set_json(json!({ "content": "Walkies at the #Park with #dogs <3" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["hashtags"], json!(["park", "dogs"]));
    assert_eq!(body["data"]["authorUsername"], "rex");

    // Comment and repost from someone else
    let req = test::TestRequest::post()
        .uri(&format!("/api/threads/{id}/comments"))
        .insert_header(bearer(&luna))
        .set_json(json!({ "content": "woof" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let repost = || {
        test::TestRequest::post()
            .uri(&format!("/api/threads/{id}/repost"))
            .insert_header(bearer(&luna))
            .to_request()
    };
    assert_eq!(test::call_service(&app, repost()).await.status(), StatusCode::CREATED);
    assert_eq!(test::call_service(&app, repost()).await.status(), StatusCode::CONFLICT);

    // Detail view
    let req = test::TestRequest::get().uri(&format!("/api/threads/{id}")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["commentCount"], 1);
    assert_eq!(body["data"]["repostCount"], 1);
    assert_eq!(body["data"]["comments"][0]["content"], "woof");
    let html = body["data"]["contentHtml"].as_str().unwrap();
    assert!(html.contains(r#"<a class="hashtag" href="/hashtag/park">#Park</a>"#));
    assert!(html.contains("&lt;3"));

    // Hashtag listing is case-insensitive
    let req = test::TestRequest::get().uri("/api/hashtags/PARK").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Only the author deletes
    let req = test::TestRequest::delete()
        .uri(&format!("/api/threads/{id}"))
        .insert_header(bearer(&luna))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/threads/{id}"))
        .insert_header(bearer(&rex))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&format!("/api/threads/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn undo_repost_needs_an_existing_repost() {
    let state = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (_, rex) = user(&state, "rex", false).await;

    let req = test::TestRequest::post()
        .uri("/api/threads")
        .insert_header(bearer(&rex))
        .set_json(json!({ "content": "hello" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let undo = || {
        test::TestRequest::delete()
            .uri(&format!("/api/threads/{id}/repost"))
            .insert_header(bearer(&rex))
            .to_request()
    };
    assert_eq!(test::call_service(&app, undo()).await.status(), StatusCode::NOT_FOUND);

    // A broken body is rejected, not reposted without its comment
    let req = test::TestRequest::post()
        .uri(&format!("/api/threads/{id}/repost"))
        .insert_header(bearer(&rex))
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"comment": "look at"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(test::call_service(&app, undo()).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/threads/{id}/repost"))
        .insert_header(bearer(&rex))
        .set_json(json!({ "comment": "look at this" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["comment"], "look at this");

    assert_eq!(test::call_service(&app, undo()).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn feed_is_newest_first_and_searchable() {
    let state = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (_, rex) = user(&state, "rex", false).await;

    for content in ["first bark", "second bark", "a meow"] {
        let req = test::TestRequest::post()
            .uri("/api/threads")
            .insert_header(bearer(&rex))
            .set_json(json!({ "content": content }))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get().uri("/api/threads?limit=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let feed = body["data"].as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["content"], "a meow");

    let req = test::TestRequest::get().uri("/api/threads?q=bark").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn posting_requires_auth_and_valid_content() {
    let state = state(quiet_mailer(), no_gateway()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
    let (_, rex) = user(&state, "rex", false).await;

    let req = test::TestRequest::post()
        .uri("/api/threads")
        .set_json(json!({ "content": "hi" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/threads")
        .insert_header(bearer(&rex))
        .set_json(json!({ "content": "   " }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
