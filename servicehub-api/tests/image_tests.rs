/// Integration tests for service image uploads

mod common;

use axum::http::{Method, StatusCode};
use common::{png_bytes, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_upload_stores_and_serves_image() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx
        .create_service(&ctx.alice, json!({ "title": "Pictured", "price": 1 }))
        .await;

    let (status, body) = ctx
        .upload(&format!("/v1/services/{}/image", id), &ctx.alice, "image", "photo.png", &png_bytes())
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], id);

    let url = body["image"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/uploads/service/"), "{}", url);
    assert!(url.ends_with(".png"));

    let stored = ctx.media.path().join(url.trim_start_matches("/media/"));
    assert!(stored.is_file(), "missing {}", stored.display());

    let (status, detail) = ctx.get(&format!("/v1/services/{}", id), &ctx.alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["image"], url.as_str());

    let (status, _) = ctx.request(Method::GET, &url, None, None).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_upload_replaces_previous_file() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx
        .create_service(&ctx.alice, json!({ "title": "Pictured", "price": 1 }))
        .await;
    let uri = format!("/v1/services/{}/image", id);

    let (_, first) = ctx.upload(&uri, &ctx.alice, "image", "a.png", &png_bytes()).await;
    let (_, second) = ctx.upload(&uri, &ctx.alice, "image", "b.png", &png_bytes()).await;

    let path = |body: &serde_json::Value| {
        ctx.media
            .path()
            .join(body["image"].as_str().unwrap().trim_start_matches("/media/"))
    };
    assert_ne!(first["image"], second["image"]);
    assert!(!path(&first).exists());
    assert!(path(&second).is_file());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx
        .create_service(&ctx.alice, json!({ "title": "Plain", "price": 1 }))
        .await;
    let uri = format!("/v1/services/{}/image", id);

    let (status, body) = ctx.upload(&uri, &ctx.alice, "image", "x.png", b"no_image").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "image");
    assert_eq!(std::fs::read_dir(ctx.media.path()).unwrap().count(), 0);

    let (status, first) = ctx.upload(&uri, &ctx.alice, "image", "a.png", &png_bytes()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.upload(&uri, &ctx.alice, "image", "x.png", b"no_image").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "image");

    let (_, detail) = ctx.get(&format!("/v1/services/{}", id), &ctx.alice).await;
    assert_eq!(detail["image"], first["image"]);

    let stored: Vec<String> = std::fs::read_dir(ctx.media.path().join("uploads/service"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(stored.len(), 1, "{:?}", stored);
    assert!(first["image"].as_str().unwrap().ends_with(&stored[0]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_upload_requires_image_field() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx
        .create_service(&ctx.alice, json!({ "title": "Plain", "price": 1 }))
        .await;

    let (status, body) = ctx
        .upload(&format!("/v1/services/{}/image", id), &ctx.alice, "picture", "a.png", &png_bytes())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "image");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_upload_to_other_owners_service_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx
        .create_service(&ctx.bob, json!({ "title": "Bob's", "price": 1 }))
        .await;

    let (status, _) = ctx
        .upload(&format!("/v1/services/{}/image", id), &ctx.alice, "image", "a.png", &png_bytes())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, detail) = ctx.get(&format!("/v1/services/{}", id), &ctx.bob).await;
    assert!(detail["image"].is_null());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_upload_over_size_limit() {
    let ctx = TestContext::with_vars(&[("MAX_UPLOAD_BYTES", "16")]).await.unwrap();
    let id = ctx
        .create_service(&ctx.alice, json!({ "title": "Big", "price": 1 }))
        .await;

    let (status, body) = ctx
        .upload(&format!("/v1/services/{}/image", id), &ctx.alice, "image", "a.png", &png_bytes())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "image");

    ctx.cleanup().await.unwrap();
}
