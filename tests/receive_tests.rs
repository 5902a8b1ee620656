mod common;

use ::serde_json::json;
use ::warp::http::StatusCode;

use common::{build_site, wire_post, LoopbackWireClient, TestSite};
use syndicate_server::content::ContentStore;
use syndicate_server::handlers::receive::{
    META_CANONICAL, META_ORIGINAL_ID, META_ORIGINAL_SITE,
};
use syndicate_server::model::PostStatus;

async fn receiving_site() -> (TestSite, std::sync::Arc<LoopbackWireClient>) {
    let client = LoopbackWireClient::new();
    let site = build_site("https://b.test/", client.clone());
    site.state.registry.set_own_credential("k1").await.unwrap();
    site.state
        .registry
        .add_site("https://a.test/", "outbound", "Site A")
        .await
        .unwrap();
    (site, client)
}

fn sample_payload() -> ::serde_json::Value {
    json!({
        "title": "Video Marketing Tips",
        "content": "<p>How to get started with video.</p>",
        "excerpt": "How to get started with video.",
        "permalink": "https://a.test/video-marketing-tips/",
        "post_id": 42,
        "site_url": "https://a.test/",
        "tags": ["video"],
        "categories": ["marketing"],
        "featured_image_url": "",
        "author": "Alice",
        "date": "2026-08-06 10:00:00"
    })
}

#[tokio::test]
async fn missing_credential_is_401() {
    let (site, _client) = receiving_site().await;

    let (status, body) = wire_post(&site.router, None, &sample_payload()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(site.content.post_count().await, 0);
}

#[tokio::test]
async fn wrong_credential_is_403_and_writes_nothing() {
    let (site, _client) = receiving_site().await;
    site.state
        .registry
        .save_keywords(1, &["video marketing".to_string()])
        .await
        .unwrap();

    let (status, body) =
        wire_post(&site.router, Some("wrong"), &sample_payload()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(site.content.post_count().await, 0);
}

#[tokio::test]
async fn test_probe_is_a_deterministic_400() {
    let (site, _client) = receiving_site().await;

    let (status, body) =
        wire_post(&site.router, Some("k1"), &json!({ "test": true })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "test request received");
    assert_eq!(site.content.post_count().await, 0);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let (site, _client) = receiving_site().await;

    let response = ::warp::test::request()
        .method("POST")
        .path("/wire/receive")
        .header(syndicate_server::client::CREDENTIAL_HEADER, "k1")
        .body("not json at all")
        .reply(&site.router)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn keyword_match_creates_a_cross_post() {
    let (site, _client) = receiving_site().await;
    site.state
        .registry
        .save_keywords(1, &["video marketing".to_string()])
        .await
        .unwrap();

    let (status, body) =
        wire_post(&site.router, Some("k1"), &sample_payload()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["matched"], true);

    let post_id = body["post_id"].as_i64().unwrap();
    let post = site.content.get_post(post_id).await.unwrap().unwrap();

    assert_eq!(post.title, "Video Marketing Tips");
    assert_eq!(post.status, PostStatus::Publish);
    // teaser body, not a mirror
    assert!(post.content.contains("Read more"));
    assert!(post
        .content
        .contains("https://a.test/video-marketing-tips/"));
    assert!(post.content.contains("rel=\"canonical\""));

    assert_eq!(
        site.content
            .get_meta(post_id, META_ORIGINAL_ID)
            .await
            .unwrap(),
        Some(json!(42))
    );
    assert_eq!(
        site.content
            .get_meta(post_id, META_ORIGINAL_SITE)
            .await
            .unwrap(),
        Some(json!("https://a.test/"))
    );
    assert_eq!(
        site.content
            .get_meta(post_id, META_CANONICAL)
            .await
            .unwrap(),
        Some(json!("https://a.test/video-marketing-tips/"))
    );
}

#[tokio::test]
async fn no_keyword_match_discards_without_writing() {
    let (site, _client) = receiving_site().await;
    site.state
        .registry
        .save_keywords(1, &["unrelated term".to_string()])
        .await
        .unwrap();

    let (status, body) =
        wire_post(&site.router, Some("k1"), &sample_payload()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["matched"], false);
    assert_eq!(site.content.post_count().await, 0);
}

#[tokio::test]
async fn empty_keyword_list_accepts_everything() {
    let (site, _client) = receiving_site().await;
    // no keywords saved for the origin site

    let (status, body) =
        wire_post(&site.router, Some("k1"), &sample_payload()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(site.content.post_count().await, 1);
}

#[tokio::test]
async fn zero_registered_sites_accepts_everything() {
    let client = LoopbackWireClient::new();
    let site = build_site("https://b.test/", client.clone());
    site.state.registry.set_own_credential("k1").await.unwrap();

    let (status, body) =
        wire_post(&site.router, Some("k1"), &sample_payload()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(site.content.post_count().await, 1);
}

#[tokio::test]
async fn update_modifies_the_existing_cross_post() {
    let (site, _client) = receiving_site().await;

    let (_, created) =
        wire_post(&site.router, Some("k1"), &sample_payload()).await;
    let created_id = created["post_id"].as_i64().unwrap();

    let mut updated = sample_payload();
    updated["title"] = json!("Video Marketing Tips (revised)");
    updated["excerpt"] = json!("Now with more detail.");
    updated["permalink"] = json!("https://a.test/video-marketing-tips-2/");
    updated["update"] = json!(true);
    updated["original_post_id"] = json!(42);

    let (status, body) = wire_post(&site.router, Some("k1"), &updated).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(body["post_id"].as_i64().unwrap(), created_id);
    assert_eq!(site.content.post_count().await, 1);

    let post = site.content.get_post(created_id).await.unwrap().unwrap();
    assert_eq!(post.title, "Video Marketing Tips (revised)");
    assert_eq!(post.excerpt, "Now with more detail.");

    // canonical follows the new permalink
    assert_eq!(
        site.content
            .get_meta(created_id, META_CANONICAL)
            .await
            .unwrap(),
        Some(json!("https://a.test/video-marketing-tips-2/"))
    );
}

#[tokio::test]
async fn update_for_an_unknown_post_becomes_a_create() {
    let (site, _client) = receiving_site().await;

    let mut payload = sample_payload();
    payload["update"] = json!(true);
    payload["original_post_id"] = json!(999);
    payload["post_id"] = json!(999);

    let (status, body) = wire_post(&site.router, Some("k1"), &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(site.content.post_count().await, 1);
}

#[tokio::test]
async fn unknown_origin_borrows_first_sites_keywords() {
    let (site, _client) = receiving_site().await;
    site.state
        .registry
        .add_site("https://c.test/", "other", "Site C")
        .await
        .unwrap();
    site.state
        .registry
        .save_keywords(1, &["video marketing".to_string()])
        .await
        .unwrap();
    site.state
        .registry
        .save_keywords(2, &["never matches anything".to_string()])
        .await
        .unwrap();

    let mut payload = sample_payload();
    payload["site_url"] = json!("https://unregistered.test/");

    // matched against site 1's list even though the origin is unknown
    let (_, body) = wire_post(&site.router, Some("k1"), &payload).await;
    assert_eq!(body["matched"], true);

    let mut payload = sample_payload();
    payload["site_url"] = json!("https://unregistered.test/");
    payload["title"] = json!("Gardening Weekly");
    payload["content"] = json!("nothing relevant");
    payload["tags"] = json!([]);
    payload["categories"] = json!([]);

    let (_, body) = wire_post(&site.router, Some("k1"), &payload).await;
    assert_eq!(body["matched"], false);
}

#[tokio::test]
async fn featured_image_failure_does_not_fail_the_create() {
    let (site, client) = receiving_site().await;
    client.fail_images();

    let mut payload = sample_payload();
    payload["featured_image_url"] = json!("https://a.test/dead-image.jpg");

    let (status, body) = wire_post(&site.router, Some("k1"), &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let post_id = body["post_id"].as_i64().unwrap();
    let post = site.content.get_post(post_id).await.unwrap().unwrap();
    assert!(post.thumbnail_url.is_none());
}

#[tokio::test]
async fn featured_image_success_sets_the_thumbnail() {
    let (site, _client) = receiving_site().await;

    let mut payload = sample_payload();
    payload["featured_image_url"] = json!("https://a.test/cover.jpg");

    let (_, body) = wire_post(&site.router, Some("k1"), &payload).await;

    let post_id = body["post_id"].as_i64().unwrap();
    let post = site.content.get_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.thumbnail_url.as_deref(), Some("https://a.test/cover.jpg"));
}

#[tokio::test]
async fn cross_posts_get_the_first_administrator_as_author() {
    let (site, _client) = receiving_site().await;
    site.content.seed_user("Bob", "editor").await;
    let admin_id = site.content.seed_user("Carol", "administrator").await;
    site.content.seed_user("Dave", "administrator").await;

    let (_, body) =
        wire_post(&site.router, Some("k1"), &sample_payload()).await;

    let post_id = body["post_id"].as_i64().unwrap();
    let post = site.content.get_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.author_id, admin_id);
    assert_eq!(post.author_name, "Carol");
}

#[tokio::test]
async fn missing_administrator_falls_back_to_a_fixed_author() {
    let (site, _client) = receiving_site().await;
    site.content.seed_user("Bob", "editor").await;

    let (_, body) =
        wire_post(&site.router, Some("k1"), &sample_payload()).await;

    let post_id = body["post_id"].as_i64().unwrap();
    let post = site.content.get_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.author_id, 1);
}
