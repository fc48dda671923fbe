//! Integration tests for the HTTP client
//!
//! Runs the client against a wiremock server to check endpoints, the
//! developer-token header and status mapping.

use cb_cli::api::{AssetClient, AssetRef, HttpClient, DEV_TOKEN_HEADER};
use cb_cli::config::{Config, Remote};
use cb_cli::error::CliError;
use cb_cli::models::{Asset, AssetKind};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let remote = Remote {
        platform_url: server.uri(),
        messaging_url: String::new(),
        system_key: "sk".to_string(),
        system_secret: "secret".to_string(),
        token: "dev-token".to_string(),
    };
    HttpClient::new(&remote, &Config::default()).unwrap()
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_get_sends_dev_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v/3/code/sk/service/hello"))
        .and(header(DEV_TOKEN_HEADER, "dev-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "hello",
            "code": "function hello() {}",
            "dependencies": "utils"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let asset = client_for(&server)
        .get(&AssetRef::new(AssetKind::Service, "hello"))
        .await
        .unwrap();

    match asset {
        Asset::Service(service) => {
            assert_eq!(service.code, "function hello() {}");
            assert_eq!(service.dependencies, "utils");
        }
        other => panic!("expected a service, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_asset_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v/3/code/sk/library/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get(&AssetRef::new(AssetKind::Library, "ghost"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("library 'ghost'"));
}

#[tokio::test]
async fn test_list_unwraps_data_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v/3/code/sk/library"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DATA": [{"name": "utils"}, {"name": "math"}]
        })))
        .mount(&server)
        .await;

    let names: Vec<String> = client_for(&server)
        .list(AssetKind::Library)
        .await
        .unwrap()
        .iter()
        .map(|a| a.name().to_string())
        .collect();

    assert_eq!(names, vec!["utils", "math"]);
}

#[tokio::test]
async fn test_user_fetch_includes_roles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/user/sk/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "ops@example.com"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/user/sk/u-1/roles"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"Name": "Operator"}, "Authenticated"])),
        )
        .mount(&server)
        .await;

    let asset = client_for(&server)
        .get(&AssetRef::new(AssetKind::User, "ops@example.com").with_id(Some("u-1")))
        .await
        .unwrap();

    match asset {
        Asset::User(user) => {
            assert_eq!(user.user_id.as_deref(), Some("u-1"));
            assert_eq!(
                user.roles,
                Some(vec!["Operator".to_string(), "Authenticated".to_string()])
            );
        }
        other => panic!("expected a user, got {other:?}"),
    }
}

// ============================================================================
// Upload version
// ============================================================================

#[tokio::test]
async fn test_upload_version_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v/4/systems/sk/upload_version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upload_version": 5})))
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).upload_version().await.unwrap(), 5);
}

#[tokio::test]
async fn test_upload_version_missing_endpoint_means_legacy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v/4/systems/sk/upload_version"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).upload_version().await.unwrap(), 0);
}

// ============================================================================
// Writes and status mapping
// ============================================================================

#[tokio::test]
async fn test_create_collection_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v/3/collectionmanagement/sk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"collectionID": "c-9"})))
        .mount(&server)
        .await;

    let weather = Asset::from_wire(AssetKind::Collection, json!({"name": "weather"})).unwrap();
    let id = client_for(&server).create(&weather).await.unwrap();

    assert_eq!(id.as_deref(), Some("c-9"));
}

#[tokio::test]
async fn test_role_delta_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/admin/user/sk/u-1/roles"))
        .and(body_json(json!({"add": ["Operator"], "delete": ["Guest"]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .update_user_roles(
            &AssetRef::new(AssetKind::User, "ops@example.com").with_id(Some("u-1")),
            &["Operator".to_string()],
            &["Guest".to_string()],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_conflict_and_auth_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v/3/code/sk/service"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v/3/code/sk/service/hello"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let hello = Asset::from_wire(AssetKind::Service, json!({"name": "hello"})).unwrap();
    let err = client.create(&hello).await.unwrap_err();
    assert!(matches!(
        err,
        CliError::Remote { ref source, .. } if matches!(**source, CliError::Conflict(_))
    ));
    assert_eq!(err.exit_code(), 4);

    let err = client
        .delete(&AssetRef::new(AssetKind::Service, "hello"))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("token expired"));
}

#[tokio::test]
async fn test_dry_run_upload_parses_plan() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v/4/systems/sk/upload"))
        .and(query_param("dryRun", "true"))
        .and(header("content-type", "application/zip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": {"create": ["hello"], "update": ["bye"]},
            "warnings": ["portal widgets are not validated"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let plan = client_for(&server)
        .dry_run_upload(b"PK\x05\x06")
        .await
        .unwrap()
        .into_plan();

    let section = plan.section(AssetKind::Service).unwrap();
    assert_eq!(section.to_create, vec!["hello"]);
    assert_eq!(section.to_update, vec!["bye"]);
    assert_eq!(plan.warnings, vec!["portal widgets are not validated"]);
}
