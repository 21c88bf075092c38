use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;

/// List non-empty rooms with their member counts
pub async fn list_rooms_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.broadcaster.rooms().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use room_broadcaster::ConnectionId;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_list_rooms() {
        let state = crate::test_helpers::test_app_state();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let _rx_a = state.broadcaster.register(a).await;
        let _rx_b = state.broadcaster.register(b).await;
        state.broadcaster.join(a, "lobby").await;
        state.broadcaster.join(b, "lobby").await;
        state.broadcaster.join(b, "annex").await;

        let app = Router::new()
            .route("/rooms", get(list_rooms_handler))
            .with_state(state);
        let resp = app
            .oneshot(Request::builder().uri("/rooms").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "annex", "members": 1},
                {"name": "lobby", "members": 2}
            ])
        );
    }
}
