mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use common::{site_file, Fleet, API_KEY, EXPRESS_TEMPLATE, NGINX_HOST_IP};
use nginx_manager::host::HostIdentity;
use nginx_manager::http::{AppState, HttpServer};
use nginx_manager::registry::MachineId;

struct TestApp {
    _root: TempDir,
    router: Router,
    app_host_id: MachineId,
    sites_available: std::path::PathBuf,
}

fn app() -> TestApp {
    let fleet = Fleet::new().with_template("express.txt", EXPRESS_TEMPLATE);
    let Fleet {
        root,
        config,
        machines,
        sites,
        app_host,
        ..
    } = fleet;

    let sites_available = config.paths.sites_available.clone();
    let state = AppState::new(
        config,
        HostIdentity::new("nginx-01", NGINX_HOST_IP),
        Arc::new(machines),
        Arc::new(sites),
    );

    TestApp {
        _root: root,
        router: HttpServer::build_router(state),
        app_host_id: app_host.id,
        sites_available,
    }
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_status_is_public() {
    let app = app();
    let request = Request::builder().uri("/status").body(Body::empty()).unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
}

#[tokio::test]
async fn test_rejects_missing_or_wrong_key() {
    let app = app();

    let request = Request::builder().uri("/nginx").body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/nginx")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_machine_name_reports_host() {
    let app = app();
    let (status, body) = send(&app.router, authed("GET", "/machines/name", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["machineName"], "nginx-01");
    assert_eq!(body["localIpAddress"], "10.0.0.2");
}

#[tokio::test]
async fn test_scan_defaults_to_configured_directory() {
    let app = app();
    std::fs::write(
        app.sites_available.join("x.com"),
        site_file("x.com", "10.0.0.5:4000"),
    )
    .unwrap();

    let (status, body) = send(&app.router, authed("POST", "/nginx/scan", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scanned"], 1);
    assert_eq!(body["newCount"], 1);
    assert_eq!(body["newEntries"][0]["serverNames"][0], "x.com");

    let (status, body) = send(&app.router, authed("GET", "/nginx", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["serverName"], "x.com");
}

#[tokio::test]
async fn test_scan_of_missing_directory_is_412() {
    let app = app();
    let (status, body) = send(
        &app.router,
        authed("POST", "/nginx/scan", Some(json!({ "directory": "/definitely/not/here" }))),
    )
    .await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["kind"], "precondition");
}

#[tokio::test]
async fn test_create_config_file() {
    let app = app();
    let payload = json!({
        "templateFileName": "express.txt",
        "serverNames": ["a.example.com", "b.example.com"],
        "appHostServerMachineId": app.app_host_id.to_string(),
        "portNumber": 8080,
        "saveDestination": "sites-available",
    });

    let (status, body) = send(
        &app.router,
        authed("POST", "/nginx/create-config-file", Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["serverName"], "a.example.com");
    assert!(app.sites_available.join("a.example.com").is_file());

    let (status, body) = send(
        &app.router,
        authed("POST", "/nginx/create-config-file", Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn test_create_validation_error_names_field() {
    let app = app();
    let payload = json!({
        "templateFileName": "express.txt",
        "serverNames": ["a.example.com"],
        "appHostServerMachineId": app.app_host_id.to_string(),
        "saveDestination": "sites-available",
    });

    let (status, body) = send(
        &app.router,
        authed("POST", "/nginx/create-config-file", Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "portNumber");
}

#[tokio::test]
async fn test_missing_field_reported_before_wrongly_typed_one() {
    let app = app();
    let payload = json!({
        "serverNames": ["a.example.com"],
        "appHostServerMachineId": app.app_host_id.to_string(),
        "portNumber": "8080",
        "saveDestination": "sites-available",
    });

    let (status, body) = send(
        &app.router,
        authed("POST", "/nginx/create-config-file", Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["field"], "templateFileName");
}

#[tokio::test]
async fn test_wrongly_typed_fields_name_their_field() {
    let app = app();
    let cases = [
        ("portNumber", json!("8080")),
        ("portNumber", json!(8080.5)),
        ("serverNames", json!("a.example.com")),
        ("templateFileName", json!(["express.txt"])),
    ];

    for (field, value) in cases {
        let mut payload = json!({
            "templateFileName": "express.txt",
            "serverNames": ["a.example.com"],
            "appHostServerMachineId": app.app_host_id.to_string(),
            "portNumber": 8080,
            "saveDestination": "sites-available",
        });
        payload[field] = value;

        let (status, body) = send(
            &app.router,
            authed("POST", "/nginx/create-config-file", Some(payload)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(body["field"], field);
    }
    assert!(!app.sites_available.join("a.example.com").exists());
}

#[tokio::test]
async fn test_malformed_json_gets_json_error_body() {
    let app = app();
    for uri in ["/nginx/create-config-file", "/machines"] {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();

        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["kind"], "validation");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_register_machine_and_reject_duplicate_address() {
    let app = app();
    let payload = json!({ "machineName": "app-02", "localIpAddress": "10.0.0.9" });

    let (status, body) = send(&app.router, authed("POST", "/machines", Some(payload.clone()))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["machineName"], "app-02");

    let (status, _) = send(&app.router, authed("POST", "/machines", Some(payload))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app.router, authed("GET", "/machines", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_clear_removes_every_record() {
    let app = app();
    std::fs::write(
        app.sites_available.join("x.com"),
        site_file("x.com", "10.0.0.5:4000"),
    )
    .unwrap();
    send(&app.router, authed("POST", "/nginx/scan", None)).await;

    let (status, body) = send(&app.router, authed("DELETE", "/nginx/clear", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);

    let (_, body) = send(&app.router, authed("GET", "/nginx", None)).await;
    assert!(body.as_array().unwrap().is_empty());
}
