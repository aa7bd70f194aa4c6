#![allow(clippy::unwrap_used)]
// Integration tests for `WpcomClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wplocal_api::{Error, SiteFilter, WpcomClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, WpcomClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let token: secrecy::SecretString = "test-token".to_string().into();
    let client = WpcomClient::new(base_url, &token).unwrap();
    (server, client)
}

fn sites_body() -> serde_json::Value {
    json!({
        "sites": [
            {
                "ID": 111,
                "name": "Production Site",
                "URL": "https://production.example.com",
                "is_wpcom_atomic": true,
                "is_wpcom_staging_site": false,
                "options": {
                    "created_at": "2023-01-10T00:00:00+00:00",
                    "wpcom_staging_blog_ids": [222]
                },
                "plan": {
                    "expired": false,
                    "is_free": false,
                    "product_slug": "business",
                    "features": { "active": ["studio-sync", "backups"] }
                }
            },
            {
                "ID": 333,
                "name": "Free Site",
                "URL": "https://free.example.com",
                "is_wpcom_atomic": false,
                "is_wpcom_staging_site": false
            }
        ]
    })
}

// ── Sites endpoint ──────────────────────────────────────────────────

#[tokio::test]
async fn list_sites_sends_auth_and_filter_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1.2/me/sites"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("filter", "atomic,wpcom"))
        .and(query_param("site_visibility", "visible"))
        .and(query_param(
            "fields",
            "name,ID,URL,plan,is_wpcom_staging_site,is_wpcom_atomic,options",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(sites_body()))
        .mount(&server)
        .await;

    let sites = client.list_sites(SiteFilter::SyncCandidates).await.unwrap();

    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].id, 111);
    assert_eq!(sites[0].name, "Production Site");
    assert!(sites[0].is_wpcom_atomic);
    assert_eq!(
        sites[0].options.as_ref().unwrap().wpcom_staging_blog_ids,
        vec![222]
    );
    assert!(sites[0]
        .plan
        .as_ref()
        .unwrap()
        .features
        .active
        .iter()
        .any(|f| f == "studio-sync"));

    // Plan-less site deserializes with plan = None
    assert_eq!(sites[1].id, 333);
    assert!(sites[1].plan.is_none());
}

#[tokio::test]
async fn list_sites_all_omits_server_filter() {
    let (server, client) = setup().await;

    // Expectation: no `filter` query param on the request.
    Mock::given(method("GET"))
        .and(path("/rest/v1.2/me/sites"))
        .and(query_param("site_visibility", "visible"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sites": [] })))
        .mount(&server)
        .await;

    let sites = client.list_sites(SiteFilter::All).await.unwrap();
    assert!(sites.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !r.url.query_pairs().any(|(k, _)| k == "filter")));
}

#[tokio::test]
async fn list_sites_unauthorized_maps_to_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1.2/me/sites"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_token"))
        .mount(&server)
        .await;

    let result = client.list_sites(SiteFilter::SyncCandidates).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn server_errors_classify_as_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1.2/me/sites"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client
        .list_sites(SiteFilter::SyncCandidates)
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert!(!err.is_not_found());
}

// ── Transfer endpoints ──────────────────────────────────────────────

#[tokio::test]
async fn create_backup_posts_to_backup_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/wpcom/v2/sites/111/studio-sync/backup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.create_backup(111).await.unwrap();
}

#[tokio::test]
async fn download_files_archive_writes_body_to_dest() {
    let (server, client) = setup().await;
    let payload = b"PK\x03\x04fake-zip-bytes".to_vec();

    Mock::given(method("GET"))
        .and(path("/wpcom/v2/sites/111/studio-sync/files"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nested").join("files.zip");
    client.download_files_archive(111, &dest).await.unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), payload);
}

#[tokio::test]
async fn upload_site_archive_sends_file_bytes() {
    let (server, client) = setup().await;

    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("site.zip");
    std::fs::write(&archive, b"local-archive").unwrap();

    Mock::given(method("POST"))
        .and(path("/wpcom/v2/sites/222/studio-sync/restore"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.upload_site_archive(222, &archive).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, b"local-archive");
}

#[tokio::test]
async fn transfer_not_found_maps_to_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/wpcom/v2/sites/999/studio-sync/backup"))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown blog"))
        .mount(&server)
        .await;

    let err = client.create_backup(999).await.unwrap_err();
    assert!(err.is_not_found());
}
