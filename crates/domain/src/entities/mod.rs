//! 领域实体定义
//!
//! 包含会话身份、入站消息和出站事件。

pub mod event;
pub mod identity;
pub mod payload;

// 重新导出核心实体
pub use event::{Event, EventBody, EventKind};
pub use identity::{Identity, SessionId, SERVER_IDENTITY};
pub use payload::{inline_image_type, Attachment, InboundPayload, OPAQUE_CONTENT_TYPE};
