use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;

use crate::AppState;
use crate::ws;

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Sender label for this connection's chat messages
    #[serde(default)]
    pub name: Option<String>,
}

/// Chat WebSocket handler - one connection per client
pub async fn chat_websocket_handler(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let broadcaster = state.broadcaster.clone();
    let metrics = state.metrics.clone();
    let display_name = state
        .server_config
        .websocket
        .display_name(params.name.as_deref());

    ws.on_upgrade(move |socket| ws::handle_chat_ws(socket, broadcaster, metrics, display_name))
}
