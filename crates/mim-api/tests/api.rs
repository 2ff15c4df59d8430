//! End-to-end tests: the API and fake geospatial services on localhost

use axum::{
    extract::Query,
    http::StatusCode,
    routing::get,
    Router,
};
use mim_api::{app, config::ApiConfig, AppState};
use mim_core::ProbeConfig;
use mim_gpkg::fixtures::GeoPackageBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_api() -> String {
    let config = ApiConfig {
        probe: ProbeConfig {
            timeout_secs: 5,
            ..Default::default()
        },
        ..Default::default()
    };
    let state = Arc::new(AppState::new(config).unwrap());
    spawn(app(state)).await
}

/// Answers GetCapabilities with a WFS document
fn fake_wfs() -> Router {
    Router::new().route(
        "/ows",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            if params.get("REQUEST").map(String::as_str) == Some("GetCapabilities") {
                (
                    StatusCode::OK,
                    "<wfs:WFS_Capabilities version=\"2.0.0\"></wfs:WFS_Capabilities>",
                )
            } else {
                (StatusCode::OK, "<html>GeoServer</html>")
            }
        }),
    )
}

/// Landing page plus conformance declaration
fn fake_features_api() -> Router {
    Router::new()
        .route("/features", get(|| async { "{\"links\": []}" }))
        .route(
            "/features/conformance",
            get(|| async { "{\"conformsTo\": [\"http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core\"]}" }),
        )
}

/// An ordinary website: root answers, nothing else does
fn fake_website() -> Router {
    Router::new().route("/", get(|| async { "<html>welcome</html>" }))
}

fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/ows", port)
}

async fn check_service(api: &str, service_url: &str) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .get(format!("{}/r1", api))
        .query(&[("service_url", service_url)])
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

async fn upload(api: &str, payload: Vec<u8>) -> reqwest::Response {
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(payload).file_name("example.gpkg"),
    );
    reqwest::Client::new()
        .post(format!("{}/r2", api))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_wfs_service_is_compliant() {
    let api = spawn_api().await;
    let wfs = spawn(fake_wfs()).await;
    let service_url = format!("{}/ows", wfs);

    let (status, body) = check_service(&api, &service_url).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "compliant");
    assert_eq!(body["service_url"], service_url.as_str());
    assert!(body["details"].as_str().unwrap().contains("valid MIM-7 OGC WFS"));
}

#[tokio::test]
async fn test_features_api_is_compliant() {
    let api = spawn_api().await;
    let features = spawn(fake_features_api()).await;

    let (status, body) = check_service(&api, &format!("{}/features", features)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "compliant");
    assert!(body["details"].as_str().unwrap().contains("OGC API Features"));
}

#[tokio::test]
async fn test_plain_website_is_unprocessable() {
    let api = spawn_api().await;
    let website = spawn(fake_website()).await;

    let (status, body) = check_service(&api, &website).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "non-compliant");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("not a valid MIM-7 standards-based web service interface"));
}

#[tokio::test]
async fn test_unreachable_service_is_bad_request() {
    let api = spawn_api().await;
    let service_url = closed_port_url();

    let (status, body) = check_service(&api, &service_url).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["service_url"], service_url.as_str());
}

#[tokio::test]
async fn test_missing_service_url_is_rejected() {
    let api = spawn_api().await;

    let response = reqwest::get(format!("{}/r1", api)).await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_geopackage_upload() {
    let api = spawn_api().await;
    let ids: Vec<i64> = (1..=10).collect();
    let payload = GeoPackageBuilder::new().points("point1", &ids).build();

    let response = upload(&api, payload).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["layer_name"], "point1");
    assert_eq!(body["contains_geospatial_data"], true);
    assert_eq!(body["identifiers_unique"], true);
    assert_eq!(body["identifiers_persistent"], true);
    assert!(body["message"].is_null());
}

#[tokio::test]
async fn test_geopackage_without_geometry() {
    let api = spawn_api().await;
    let payload = GeoPackageBuilder::new().attributes("owners", &[1, 2, 3]).build();

    let body: Value = upload(&api, payload).await.json().await.unwrap();
    assert_eq!(body["contains_geospatial_data"], false);
    assert_eq!(body["message"], "No geospatial data found in any layer");
}

#[tokio::test]
async fn test_garbage_upload_reports_in_body() {
    let api = spawn_api().await;

    let response = upload(&api, b"definitely not sqlite".to_vec()).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["contains_geospatial_data"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Error listing layers"));
}

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let api = spawn_api().await;

    let response = upload(&api, Vec::new()).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_ping() {
    let api = spawn_api().await;

    let response = reqwest::get(format!("{}/ping", api)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    let uptime = body["uptime"].as_str().unwrap();
    assert!(!uptime.contains('.'));
    assert_eq!(uptime.split(':').count(), 3);
    assert!(body["startup_time"].as_str().unwrap().ends_with('Z'));
    assert!(body["current_time"].as_str().unwrap() >= body["startup_time"].as_str().unwrap());
}
