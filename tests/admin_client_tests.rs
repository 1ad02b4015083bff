//! Integration tests for the Admin API client and push operations.

use serde_json::json;
use shopify_install::clients::{
    push_products, push_theme, AdminClient, AdminError, ProductDraft, ThemeRole, CSS_ASSET_KEY,
    INDEX_ASSET_KEY, THEME_NAME,
};
use shopify_install::{AccessToken, ApiVersion, ShopDomain, StoredCredential};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client(server: &MockServer) -> AdminClient {
    let credential = StoredCredential::new(
        ShopDomain::new("shop-a.example.com").unwrap(),
        AccessToken::new("tok_admin"),
        "write_products,write_themes".parse().unwrap(),
    );
    AdminClient::new(&credential, &ApiVersion::V2025_01)
        .unwrap()
        .with_base_uri(server.uri())
}

fn draft(title: &str, price: &str) -> ProductDraft {
    ProductDraft {
        title: title.to_string(),
        body_html: format!("<p>{title}</p>"),
        price: price.to_string(),
    }
}

#[tokio::test]
async fn test_requests_carry_token_and_accept_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2025-01/themes.json"))
        .and(header("x-shopify-access-token", "tok_admin"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "theme": {"id": 7, "name": "T", "role": "unpublished"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let theme = client.create_theme("T", ThemeRole::Unpublished).await.unwrap();
    assert_eq!(theme.id, 7);
    assert_eq!(theme.role.as_deref(), Some("unpublished"));
}

#[tokio::test]
async fn test_push_theme_creates_theme_then_uploads_assets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2025-01/themes.json"))
        .and(body_json(json!({"theme": {"name": THEME_NAME, "role": "unpublished"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "theme": {"id": 99, "name": THEME_NAME}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/api/2025-01/themes/99/assets.json"))
        .and(body_json(json!({"asset": {"key": CSS_ASSET_KEY, "value": "body{}"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"asset": {}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/api/2025-01/themes/99/assets.json"))
        .and(body_json(json!({"asset": {"key": INDEX_ASSET_KEY, "value": "<h1>Hi</h1>"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"asset": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let theme_id = push_theme(&client, "<h1>Hi</h1>", "body{}").await.unwrap();
    assert_eq!(theme_id, 99);
}

#[tokio::test]
async fn test_push_theme_stops_when_theme_creation_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2025-01/themes.json"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("X-Request-Id", "req-403")
                .set_body_string("forbidden detail"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = push_theme(&client, "<h1/>", "").await.unwrap_err();

    match &err {
        AdminError::Response { status, request_id } => {
            assert_eq!(*status, 403);
            assert_eq!(request_id.as_deref(), Some("req-403"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.to_string().contains("forbidden detail"));
}

#[tokio::test]
async fn test_theme_response_without_theme_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2025-01/themes.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client
        .create_theme(THEME_NAME, ThemeRole::Unpublished)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::UnexpectedResponse { .. }));
}

#[tokio::test]
async fn test_push_products_sends_single_variant_each() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2025-01/products.json"))
        .and(body_json(json!({
            "product": {
                "title": "Mug",
                "body_html": "<p>Mug</p>",
                "variants": [{"price": "12.50"}]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "product": {"id": 1, "title": "Mug"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2025-01/products.json"))
        .and(body_json(json!({
            "product": {
                "title": "Cap",
                "body_html": "<p>Cap</p>",
                "variants": [{"price": "8"}]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "product": {"id": 2, "title": "Cap"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let created = push_products(&client, &[draft("Mug", "12.50"), draft("Cap", "8")])
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["id"], 1);
    assert_eq!(created[1]["title"], "Cap");
}

#[tokio::test]
async fn test_push_products_stops_at_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2025-01/products.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = push_products(&client, &[draft("A", "1"), draft("B", "2")])
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Response { status: 500, .. }));
}

#[tokio::test]
async fn test_deprecated_reason_header_does_not_fail_request() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/admin/api/2025-01/themes/5/assets.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Shopify-API-Deprecated-Reason", "https://shopify.dev/changelog")
                .set_body_json(json!({"asset": {"key": "assets/ai.css"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    assert!(client.put_asset(5, CSS_ASSET_KEY, "a{}").await.is_ok());
}
