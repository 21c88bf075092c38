//! Client event dispatcher.
//!
//! Maps each decoded `ClientEvent` onto the broadcaster contract. Kept apart
//! from the socket loop so it can be exercised without a live connection.

use std::sync::Arc;
use tracing::debug;

use room_broadcaster::{Broadcaster, ClientEvent, ConnectionId, ServerEvent};

use crate::metrics::ServerMetrics;

/// Per-connection context shared by the reader loop and the dispatcher.
pub(crate) struct ConnectionContext {
    pub connection_id: ConnectionId,
    /// Label prefixed to this connection's chat messages
    pub display_name: String,
    pub broadcaster: Arc<Broadcaster>,
    pub metrics: Arc<ServerMetrics>,
}

pub(crate) async fn dispatch_client_event(ctx: &ConnectionContext, event: ClientEvent) {
    match event {
        ClientEvent::JoinRoom { room } => {
            if ctx.broadcaster.join(ctx.connection_id, &room).await {
                ctx.metrics.room_joined();
            }
        }
        ClientEvent::LeaveRoom { room } => {
            if ctx.broadcaster.leave(ctx.connection_id, &room).await {
                ctx.metrics.room_left();
            }
        }
        ClientEvent::RoomMessage { room, message } => {
            let delivered = ctx
                .broadcaster
                .broadcast_room(&room, ServerEvent::room_message(&ctx.display_name, &message))
                .await;
            debug!(conn_id = %ctx.connection_id, room = %room, delivered, "Room message");
        }
        ClientEvent::SendMessage { message } => {
            let delivered = ctx
                .broadcaster
                .broadcast_global(ServerEvent::message(&ctx.display_name, &message))
                .await;
            debug!(conn_id = %ctx.connection_id, delivered, "Global message");
        }
    }
}
