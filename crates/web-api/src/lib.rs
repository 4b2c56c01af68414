//! Web API 层。
//!
//! 提供 Axum 路由：`/ws` 升级为聊天会话并交给应用层的中枢，
//! `/attachments/{key}` 校验签名后返回附件内容。

mod attachments;
mod error;
mod routes;
mod state;
mod websocket;
mod ws_transport;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
pub use ws_transport::{WsInbound, WsOutbound};
