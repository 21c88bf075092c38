//! WebSocket Handler
//!
//! Main chat WebSocket connection handler.

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use room_broadcaster::{Broadcaster, ClientEvent, ConnectionId, ServerEvent};

use crate::metrics::ServerMetrics;

use super::dispatch::{ConnectionContext, dispatch_client_event};

/// Handle one chat WebSocket connection from upgrade to close
pub async fn handle_chat_ws(
    socket: WebSocket,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<ServerMetrics>,
    display_name: String,
) {
    let connection_id = ConnectionId::new();
    info!(conn_id = %connection_id, user = %display_name, "New chat WebSocket connection");
    metrics.connection_opened();

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut rx = broadcaster.register(connection_id).await;

    // The greeting is written before the writer task starts, so it always
    // precedes anything the broadcaster has already queued.
    match (ServerEvent::Connected { connection_id }).to_json() {
        Ok(json) => {
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                warn!(conn_id = %connection_id, "Failed to send greeting - socket closed");
            }
        }
        Err(e) => error!("Failed to serialize greeting: {}", e),
    }

    // Task to send messages to WebSocket
    let sender_conn_id = connection_id;
    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match event.to_json() {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                debug!(conn_id = %sender_conn_id, "Socket closed while sending");
                break;
            }
        }
        // Queue closed: either the connection was unregistered or the
        // broadcaster shut down. Either way the socket is done.
        let _ = ws_sender.close().await;
    });

    let ctx = ConnectionContext {
        connection_id,
        display_name,
        broadcaster: broadcaster.clone(),
        metrics: metrics.clone(),
    };

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics.message_received();
                match ClientEvent::parse(text.as_str()) {
                    Ok(event) => dispatch_client_event(&ctx, event).await,
                    Err(e) => {
                        metrics.message_rejected();
                        debug!(conn_id = %connection_id, "Ignoring client frame: {}", e);
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                metrics.message_received();
                metrics.message_rejected();
                debug!("Binary messages not supported");
            }
            Ok(Message::Close(_)) => {
                info!(conn_id = %connection_id, "WebSocket connection closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                // Dropped tab or lost network: routine, not a server fault
                metrics.abrupt_disconnect();
                debug!(conn_id = %connection_id, "WebSocket ended without close handshake: {}", e);
                break;
            }
        }
    }

    // Cleanup
    broadcaster.unregister(connection_id).await;
    sender_task.abort();
    metrics.connection_closed();
    info!(conn_id = %connection_id, "Chat WebSocket connection ended");
}
