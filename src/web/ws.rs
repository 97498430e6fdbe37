//! WebSocket transport: one observer per socket.
//!
//! Clients connect to `GET /ws`, receive the current `printerState`
//! immediately and then every subsequent snapshot. Text frames from the
//! client are decoded as commands; anything undecodable is answered with an
//! `error` event on the same socket.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use super::hub::{BroadcastHub, ObserverHandle, ObserverId};
use crate::printer::PrinterError;

pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<BroadcastHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: BroadcastHub) {
    let (mut sender, mut receiver) = socket.split();
    let (observer, mut events) = ObserverHandle::channel();
    let observer_id = observer.id();

    if let Err(e) = hub.on_connect(observer).await {
        tracing::error!(observer_id = %observer_id, error = %e, "Failed to attach observer");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                tracing::debug!(observer_id = %observer_id, "WebSocket send failed, closing");
                break;
            }
        }
    });

    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => handle_frame(&recv_hub, &observer_id, text.as_str()).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(observer_id = %observer_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.on_disconnect(&observer_id);
}

async fn handle_frame(hub: &BroadcastHub, observer_id: &ObserverId, text: &str) {
    match hub.on_frame(observer_id, text).await {
        Ok(()) | Err(PrinterError::Busy | PrinterError::MalformedCommand(_)) => {}
        Err(e) => tracing::error!(observer_id = %observer_id, error = %e, "Command failed"),
    }
}
