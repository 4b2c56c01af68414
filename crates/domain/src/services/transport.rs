//! 传输会话接口
//!
//! 一条双向、按消息分帧的连接，拆分为读端和写端，
//! 这样写任务和接收循环可以各自独立运行。

use async_trait::async_trait;

use crate::entities::{Event, InboundPayload};
use crate::errors::HubError;

/// 读端
#[async_trait]
pub trait InboundStream: Send {
    /// 挂起直到收到下一条消息
    ///
    /// 单个帧无法解析时返回 `TransportRead`，调用方应继续读取；
    /// 连接不可恢复地关闭时返回 `TransportClosed`。
    async fn receive(&mut self) -> Result<InboundPayload, HubError>;
}

/// 写端
#[async_trait]
pub trait OutboundSink: Send {
    async fn send(&mut self, event: &Event) -> Result<(), HubError>;

    /// 关闭连接，重复调用是安全的
    async fn close(&mut self);
}
