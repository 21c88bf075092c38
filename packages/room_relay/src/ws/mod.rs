//! Chat WebSocket Handler
//!
//! One WebSocket per client. Inbound frames are decoded into client events
//! and dispatched onto the shared broadcaster; a writer task drains the
//! connection's outbound queue onto the socket.

pub(crate) mod dispatch;
mod handler;


pub use handler::handle_chat_ws;
