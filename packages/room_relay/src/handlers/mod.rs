pub mod health;
pub mod rooms;
pub mod websocket;

// Re-export all handlers for easy route registration
pub use health::{health_handler, health_live_handler, metrics_handler, root_handler};
pub use rooms::list_rooms_handler;
pub use websocket::chat_websocket_handler;
