//! Post pages: create, edit, comments, pagination and the home page cache.

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use blog_service::db::EntityStore;
use blog_service::models::PostFilter;
use blog_service::routes;
use common::{TestContext, PAGE_SIZE};
use serde_json::{json, Value};

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn test_create_post_redirects_to_profile() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let group = ctx.group("cats").await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(ctx.auth_header(&author))
        .set_json(json!({"text": "New post", "group": group.id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/leo/");

    let posts = ctx.store.list_posts(PostFilter::All).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "New post");
    assert_eq!(posts[0].author_id, author.id);
    assert_eq!(posts[0].group_id, Some(group.id));
}

#[actix_web::test]
async fn test_create_post_with_invalid_form_creates_nothing() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(ctx.auth_header(&author))
        .set_json(json!({"text": "   ", "group": 12345}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["text"].is_array());

    assert_eq!(ctx.store.count_posts(PostFilter::All).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_author_edits_post() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let post = ctx.post(&author, "Before", None).await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let uri = format!("/posts/{}/edit/", post.id);
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(ctx.auth_header(&author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_edit"], true);
    assert_eq!(body["post"]["text"], "Before");

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.auth_header(&author))
        .set_json(json!({"text": "After"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let edited = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(edited.id, post.id);
    assert_eq!(edited.text, "After");
    assert_eq!(edited.created_at, post.created_at);
    assert_eq!(ctx.store.count_posts(PostFilter::All).await.unwrap(), 1);
}

#[actix_web::test]
async fn test_non_author_edit_redirects_to_own_profile() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let intruder = ctx.user("anna").await;
    let post = ctx.post(&author, "Original", None).await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let uri = format!("/posts/{}/edit/", post.id);
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(ctx.auth_header(&intruder))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/anna/");

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.auth_header(&intruder))
        .set_json(json!({"text": "Hijacked"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/anna/");

    let unchanged = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(unchanged, post);
}

#[actix_web::test]
async fn test_post_detail_context() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let reader = ctx.user("anna").await;
    let post = ctx.post(&author, "Hello", None).await;
    ctx.post(&author, "Second", None).await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let comment_uri = format!("/posts/{}/comment/", post.id);
    let req = test::TestRequest::post()
        .uri(&comment_uri)
        .insert_header(ctx.auth_header(&reader))
        .set_json(json!({"text": "Nice one"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["text"], "Hello");
    assert_eq!(body["posts_count"], 2);
    assert_eq!(body["comments"][0]["text"], "Nice one");
    assert_eq!(body["comments"][0]["author_username"], "anna");
    assert_eq!(body["form"][0]["name"], "text");
}

#[actix_web::test]
async fn test_comment_validation_and_missing_post() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let post = ctx.post(&author, "Hello", None).await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(ctx.auth_header(&author))
        .set_json(json!({"text": ""}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::post()
        .uri("/posts/999/comment/")
        .insert_header(ctx.auth_header(&author))
        .set_json(json!({"text": "hi"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    assert!(ctx.store.list_comments(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_listings_are_paginated() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let group = ctx.group("cats").await;
    for i in 0..13 {
        ctx.post(&author, &format!("Post {}", i), Some(group.id)).await;
    }
    let reader = ctx.user("anna").await;
    ctx.store
        .insert_follow_if_absent(reader.id, author.id)
        .await
        .unwrap();
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    for base in ["/", "/group/cats/", "/profile/leo/", "/follow/"] {
        let req = test::TestRequest::get()
            .uri(base)
            .insert_header(ctx.auth_header(&reader))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let page = &body["page_obj"];
        assert_eq!(page["items"].as_array().unwrap().len(), PAGE_SIZE, "{}", base);
        assert_eq!(page["total_count"], 13);
        assert_eq!(page["items"][0]["text"], "Post 12");

        let req = test::TestRequest::get()
            .uri(&format!("{}?page=2", base))
            .insert_header(ctx.auth_header(&reader))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["page_obj"]["items"].as_array().unwrap().len(), 3, "{}", base);
        assert_eq!(body["page_obj"]["number"], 2);
    }
}

#[actix_web::test]
async fn test_profile_context() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let reader = ctx.user("anna").await;
    ctx.post(&author, "Hello", None).await;
    ctx.store
        .insert_follow_if_absent(reader.id, author.id)
        .await
        .unwrap();
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let req = test::TestRequest::get()
        .uri("/profile/leo/")
        .insert_header(ctx.auth_header(&reader))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["author"]["username"], "leo");
    assert_eq!(body["author"]["full_name"], "Test leo");
    assert_eq!(body["posts_count"], 1);
    assert_eq!(body["following"], true);

    let req = test::TestRequest::get().uri("/profile/leo/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["following"], false);
}

#[actix_web::test]
async fn test_home_page_is_cached_until_invalidated() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    ctx.post(&author, "First", None).await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let first = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;

    // Bypasses the post service, so nothing invalidates the cache.
    ctx.post(&author, "Sneaky", None).await;

    let second =
        test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(first, second);

    ctx.state.feed_cache.invalidate();

    let third = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_ne!(first, third);
    let body: Value = serde_json::from_slice(&third).unwrap();
    assert_eq!(body["page_obj"]["items"][0]["text"], "Sneaky");
}

#[actix_web::test]
async fn test_creating_post_through_http_refreshes_home_page() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let before: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(before["page_obj"]["total_count"], 0);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(ctx.auth_header(&author))
        .set_json(json!({"text": "Fresh"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

    let after: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(after["page_obj"]["total_count"], 1);
    assert_eq!(after["page_obj"]["items"][0]["text"], "Fresh");
}
