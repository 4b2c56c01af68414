//! WebSocket 处理器
//!
//! 校验用户名后升级连接，接入中枢并运行会话直到连接结束。

use axum::{
    extract::{ws::WebSocket, Query, State, WebSocketUpgrade},
    response::Response,
};
use domain::identity_allocator;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};

use application::run_session;

use crate::{
    error::ApiError,
    state::AppState,
    ws_transport::{WsInbound, WsOutbound},
};

/// WebSocket连接查询参数
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    pub username: String,
}

/// 处理WebSocket连接升级
///
/// 用户名为空时在升级前返回 400，连接不会被准入。
pub async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let username = identity_allocator::validate_requested(&query.username)
        .map_err(|err| {
            warn!(error = %err, "WebSocket 升级被拒绝");
            err
        })?
        .to_string();

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, username)))
}

async fn handle_socket(socket: WebSocket, state: AppState, username: String) {
    let joined = match state.hub.connect(&username).await {
        Ok(joined) => joined,
        Err(err) => {
            warn!(requested = %username, error = %err, "会话准入失败");
            return;
        }
    };
    let session_id = joined.handle.id();
    info!(session_id = %session_id, identity = %joined.identity, "WebSocket 连接已建立");

    let (sink, stream) = socket.split();
    run_session(
        state.hub.clone(),
        joined,
        WsInbound::new(stream),
        WsOutbound::new(sink),
    )
    .await;

    info!(session_id = %session_id, "WebSocket 连接已结束");
}
