//! Shared test fixtures.

use crate::AppState;
use crate::config::ServerConfig;

/// App state with default config and an empty broadcaster.
pub fn test_app_state() -> AppState {
    AppState::new(ServerConfig::default())
}

/// Bind the full app on an ephemeral localhost port and serve it in the
/// background. Returns the bound address and the state behind it.
pub async fn spawn_test_server() -> (std::net::SocketAddr, AppState) {
    let state = test_app_state();
    let app = crate::build_app(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}
