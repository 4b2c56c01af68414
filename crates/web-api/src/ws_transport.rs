//! WebSocket 传输适配
//!
//! 把 axum 的 `WebSocket` 拆分后的读端和写端适配为领域层的
//! `InboundStream` / `OutboundSink`。

use async_trait::async_trait;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{Event, HubError, InboundPayload, InboundStream, OutboundSink};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tracing::debug;

/// 读端：文本帧和二进制帧都按 JSON 解析
pub struct WsInbound {
    stream: SplitStream<WebSocket>,
}

impl WsInbound {
    pub fn new(stream: SplitStream<WebSocket>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl InboundStream for WsInbound {
    async fn receive(&mut self) -> Result<InboundPayload, HubError> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return parse_payload(text.as_str().as_bytes()),
                Some(Ok(WsMessage::Binary(bytes))) => return parse_payload(&bytes),
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame
                        .map(|frame| format!("close frame {}", frame.code))
                        .unwrap_or_else(|| "close frame".to_string());
                    return Err(HubError::transport_closed(reason));
                }
                Some(Err(err)) => return Err(HubError::transport_closed(err.to_string())),
                None => return Err(HubError::transport_closed("stream ended")),
            }
        }
    }
}

/// 写端：事件序列化为 JSON 文本帧
pub struct WsOutbound {
    sink: SplitSink<WebSocket, WsMessage>,
    closed: bool,
}

impl WsOutbound {
    pub fn new(sink: SplitSink<WebSocket, WsMessage>) -> Self {
        Self {
            sink,
            closed: false,
        }
    }
}

#[async_trait]
impl OutboundSink for WsOutbound {
    async fn send(&mut self, event: &Event) -> Result<(), HubError> {
        if self.closed {
            return Err(HubError::transport_closed("sink already closed"));
        }
        let json = serde_json::to_string(event)
            .map_err(|err| HubError::transport_closed(format!("serialize event: {err}")))?;
        self.sink
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|err| HubError::transport_closed(err.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // 对端可能已经断开，关闭失败只记录
        if let Err(err) = self.sink.send(WsMessage::Close(None)).await {
            debug!(error = %err, "发送关闭帧失败");
        }
        if let Err(err) = self.sink.close().await {
            debug!(error = %err, "关闭写端失败");
        }
    }
}

fn parse_payload(bytes: &[u8]) -> Result<InboundPayload, HubError> {
    serde_json::from_slice(bytes).map_err(|err| HubError::transport_read(err.to_string()))
}
