//! Defines the Axum API routes and handlers.

use std::path::Path;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::hub::BroadcastHub;
use super::models::StartPrintRequest;
use super::ws::ws_handler;
use crate::printer::{PrinterCommand, PrinterError};

pub type AppState = BroadcastHub;

/// Helper to create a JSON error response with a message and status code
fn json_error(message: &str, status: StatusCode) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn command_response(result: Result<(), PrinterError>) -> axum::response::Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "result": "ok" }))).into_response(),
        Err(e @ PrinterError::Busy) => json_error(&e.to_string(), StatusCode::CONFLICT),
        Err(e @ PrinterError::MalformedCommand(_)) => json_error(&e.to_string(), StatusCode::BAD_REQUEST),
        Err(PrinterError::ChannelClosed) => json_error("Internal error", StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router(hub: AppState) -> Router {
    Router::new()
        .route("/api/printer", get(get_printer))
        .route("/api/printer/print", post(start_print))
        .route("/api/printer/cancel", post(cancel_print))
        .route("/api/printer/home", post(start_homing))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

/// Like [`create_router`], with unmatched paths served from `static_dir`
/// and falling back to its `index.html`.
pub fn create_router_with_assets(hub: AppState, static_dir: &Path) -> Router {
    let assets = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));
    create_router(hub).fallback_service(assets)
}

/// Handler returning the current printer snapshot.
async fn get_printer(State(hub): State<AppState>) -> axum::response::Response {
    match hub.snapshot().await {
        Ok(state) => (StatusCode::OK, Json(state)).into_response(),
        Err(_) => json_error("Internal error", StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn start_print(
    State(hub): State<AppState>,
    Json(payload): Json<StartPrintRequest>,
) -> axum::response::Response {
    tracing::info!(job = %payload.name, "Print requested over HTTP");
    command_response(hub.execute(PrinterCommand::StartPrint { name: payload.name }).await)
}

async fn cancel_print(State(hub): State<AppState>) -> axum::response::Response {
    command_response(hub.execute(PrinterCommand::CancelPrint).await)
}

async fn start_homing(State(hub): State<AppState>) -> axum::response::Response {
    command_response(hub.execute(PrinterCommand::StartHoming).await)
}
