//! 应用层实现。
//!
//! 围绕领域模型的用例：会话注册表、消息路由与扇出、附件上传，
//! 以及把传输会话绑定到中枢的连接生命周期管理。

pub mod connection;
pub mod hub;
pub mod registry;
pub mod session;
pub mod uploader;

pub use connection::run_session;
pub use hub::{ChatHub, HubOptions, JoinedSession};
pub use registry::SessionRegistry;
pub use session::{SessionHandle, SessionState};
pub use uploader::AttachmentUploader;
