//! 领域服务定义
//!
//! 身份分配、消息分类等纯逻辑，以及中枢依赖的外部协作方接口。

pub mod dispatch;
pub mod identity_allocator;
pub mod object_store;
pub mod transport;

// 重新导出服务
pub use dispatch::{classify, Delivery, Dispatch};
pub use object_store::ObjectStore;
#[cfg(feature = "testing")]
pub use object_store::MockObjectStore;
pub use transport::{InboundStream, OutboundSink};
