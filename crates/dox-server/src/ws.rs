//! Live reload WebSocket endpoint.
//!
//! Each connected client gets a subscription to the watcher's reload
//! broadcast; events are forwarded as single JSON text frames.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::state::AppState;

/// `GET /ws/reload`: upgrade to a WebSocket and stream reload events.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let Some(watcher) = state.watcher.as_ref() else {
        debug!("live reload disabled, closing websocket");
        return;
    };
    let mut events = watcher.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(error = %e, "failed to serialize reload event");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            debug!("websocket client disconnected");
                            break;
                        }
                    }
                    // A slow client skips events it missed and keeps going.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "reload subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            message = socket.recv() => {
                match message {
                    Some(Ok(Message::Close(_))) | None => break,
                    // Other client frames (pings, stray text) are ignored.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }
}
