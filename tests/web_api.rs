//! Integration tests for the HTTP API.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt; // for .collect().await
use printer_sim::{SimulationConfig, spawn_printer, web::api::create_router};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

fn app() -> axum::Router {
    let (hub, _task) = spawn_printer(SimulationConfig::default());
    create_router(hub)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn post(uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method("POST").uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get_printer() -> Request<Body> {
    Request::builder().uri("/api/printer").body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_get_printer_returns_snapshot() {
    let response = app().oneshot(get_printer()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({
            "status": "Idle",
            "printProgress": 0.0,
            "temperature": { "hotend": 25.0, "bed": 25.0 },
            "tempHistory": { "timestamps": [], "extruderData": [], "bedData": [], "piData": [] }
        })
    );
}

#[tokio::test]
async fn test_start_print_then_busy() {
    let app = app();
    let response = app
        .clone()
        .oneshot(post("/api/printer/print", Some(json!({ "name": "benchy.gcode" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["result"], "ok");

    let response = app.clone().oneshot(get_printer()).await.unwrap();
    assert_eq!(body_json(response).await["status"], "Printing");

    let response = app
        .clone()
        .oneshot(post("/api/printer/print", Some(json!({ "name": "other" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Printer is busy");
}

#[tokio::test]
async fn test_cancel_print() {
    let app = app();
    app.clone()
        .oneshot(post("/api/printer/print", Some(json!({ "name": "job" }))))
        .await
        .unwrap();
    let response = app.clone().oneshot(post("/api/printer/cancel", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(app.clone().oneshot(get_printer()).await.unwrap()).await;
    assert_eq!(json["status"], "Idle");
    assert_eq!(json["printProgress"], 0.0);

    // Cancelling while idle is accepted and changes nothing.
    let response = app.clone().oneshot(post("/api/printer/cancel", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_home_overrides_print() {
    let app = app();
    app.clone()
        .oneshot(post("/api/printer/print", Some(json!({ "name": "job" }))))
        .await
        .unwrap();
    let response = app.clone().oneshot(post("/api/printer/home", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(app.clone().oneshot(get_printer()).await.unwrap()).await;
    assert_eq!(json["status"], "Homing");
}

#[tokio::test]
async fn test_start_print_with_bad_payload_is_rejected() {
    let response = app()
        .oneshot(post("/api/printer/print", Some(json!({ "name": 42 }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let request = Request::builder()
        .uri("/api/printer")
        .header("origin", "http://dashboard.local")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-origin"));
}
