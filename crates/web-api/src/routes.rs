use axum::{http::StatusCode, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{attachments::fetch_attachment, state::AppState, websocket::websocket_upgrade};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_upgrade))
        .route("/attachments/{key}", get(fetch_attachment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}
