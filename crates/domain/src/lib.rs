//! 聊天中枢核心领域模型
//!
//! 包含会话身份、入站消息、出站事件，以及身份分配和消息分类等纯逻辑。

pub mod entities;
pub mod errors;
pub mod services;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use services::*;
