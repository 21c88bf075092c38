//! Room Broadcaster - room-scoped publish/subscribe for chat connections
//!
//! This crate tracks which live connections belong to which rooms and fans
//! events out either to every connection or to the members of one room.
//! It has no HTTP dependencies; the transport owns the sockets and drains
//! the per-connection queues handed out by [`Broadcaster::register`].
//!
//! # Example
//!
//! ```no_run
//! use room_broadcaster::{Broadcaster, ConnectionId, ServerEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let broadcaster = Broadcaster::default();
//!
//!     let id = ConnectionId::new();
//!     let mut rx = broadcaster.register(id).await;
//!
//!     broadcaster.join(id, "lobby").await;
//!     broadcaster
//!         .broadcast_room("lobby", ServerEvent::room_message("User", "hi"))
//!         .await;
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{}", event.to_json().unwrap());
//!     }
//! }
//! ```

mod broadcaster;
mod connection;
mod error;
pub mod event;

pub use broadcaster::{Broadcaster, BroadcasterConfig, DeliverySnapshot, RoomSummary};
pub use connection::ConnectionId;
pub use error::ProtocolError;
pub use event::{ClientEvent, ServerEvent};
