//! Posts submitted as multipart forms, with and without an image.

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use blog_service::db::EntityStore;
use blog_service::models::PostFilter;
use blog_service::routes;
use common::TestContext;
use serde_json::{json, Value};

const BOUNDARY: &str = "----blog-test-boundary";

const SMALL_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}

fn stored_files(ctx: &TestContext) -> usize {
    std::fs::read_dir(ctx.media_dir.path().join("posts"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[actix_web::test]
async fn test_create_post_with_image_stores_file() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let group = ctx.group("cats").await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let group_id = group.id.to_string();
    let req = multipart_request(
        "/create/",
        &[
            Part::Text("text", "Post with a picture"),
            Part::Text("group", &group_id),
            Part::File("image", "small.gif", SMALL_GIF),
        ],
    )
    .insert_header(ctx.auth_header(&author))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/profile/leo/");

    let posts = ctx.store.list_posts(PostFilter::All).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "Post with a picture");
    assert_eq!(posts[0].group_id, Some(group.id));
    let key = posts[0].image.clone().unwrap();
    assert!(key.starts_with("posts/") && key.ends_with(".gif"), "{}", key);
    assert_eq!(std::fs::read(ctx.media_dir.path().join(&key)).unwrap(), SMALL_GIF);

    // The detail page exposes the key and the file is served back.
    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", posts[0].id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["image"], json!(key));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&format!("/media/{}", key)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/gif");
    assert_eq!(&test::read_body(resp).await[..], SMALL_GIF);
}

#[actix_web::test]
async fn test_create_post_multipart_without_image() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    // An untouched file input still sends an empty part.
    let req = multipart_request(
        "/create/",
        &[Part::Text("text", "Just words"), Part::File("image", "", b"")],
    )
    .insert_header(ctx.auth_header(&author))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

    let posts = ctx.store.list_posts(PostFilter::All).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].image.is_none());
    assert_eq!(stored_files(&ctx), 0);
}

#[actix_web::test]
async fn test_invalid_upload_creates_nothing() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let req = multipart_request(
        "/create/",
        &[
            Part::Text("text", " "),
            Part::Text("group", "not-a-number"),
            Part::File("image", "notes.gif", b"definitely not a gif"),
        ],
    )
    .insert_header(ctx.auth_header(&author))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    for field in ["text", "group", "image"] {
        assert!(body["fields"][field].is_array(), "missing error for {}", field);
    }

    // A valid image next to an unknown group is not written either.
    let req = multipart_request(
        "/create/",
        &[
            Part::Text("text", "Nice"),
            Part::Text("group", "9999"),
            Part::File("image", "small.gif", SMALL_GIF),
        ],
    )
    .insert_header(ctx.auth_header(&author))
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    assert_eq!(ctx.store.count_posts(PostFilter::All).await.unwrap(), 0);
    assert_eq!(stored_files(&ctx), 0);
}

#[actix_web::test]
async fn test_edit_post_replaces_image() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let post = ctx.post(&author, "Before", None).await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let uri = format!("/posts/{}/edit/", post.id);
    let req = multipart_request(
        &uri,
        &[
            Part::Text("text", "After"),
            Part::File("image", "small.gif", SMALL_GIF),
        ],
    )
    .insert_header(ctx.auth_header(&author))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
        format!("/posts/{}/", post.id)
    );

    let edited = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "After");
    let key = edited.image.clone().unwrap();
    assert!(ctx.media_dir.path().join(&key).is_file());

    // A later JSON edit keeps the image.
    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.auth_header(&author))
        .set_json(json!({"text": "Text only", "image": "posts/other.gif"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);
    let edited = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "Text only");
    assert_eq!(edited.image, Some(key));
}

#[actix_web::test]
async fn test_non_author_upload_is_refused_without_storing() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let intruder = ctx.user("anna").await;
    let post = ctx.post(&author, "Original", None).await;
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    let req = multipart_request(
        &format!("/posts/{}/edit/", post.id),
        &[
            Part::Text("text", "Hijacked"),
            Part::File("image", "small.gif", SMALL_GIF),
        ],
    )
    .insert_header(ctx.auth_header(&intruder))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/profile/anna/");

    assert_eq!(ctx.store.find_post(post.id).await.unwrap().unwrap(), post);
    assert_eq!(stored_files(&ctx), 0);
}

#[actix_web::test]
async fn test_unknown_media_is_404() {
    let ctx = TestContext::new();
    let app =
        test::init_service(App::new().app_data(ctx.state.clone()).configure(routes::configure))
            .await;

    for uri in ["/media/posts/missing.gif", "/media/posts/../../etc/passwd"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "GET {}", uri);
    }
}
