//! 测试用的内存传输和辅助函数

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use application::{ChatHub, HubOptions};
use async_trait::async_trait;
use domain::{Event, HubError, InboundPayload, InboundStream, MockObjectStore, OutboundSink};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// 由测试推送入站结果的读端，发送端丢弃即视为连接关闭
pub struct ChannelInbound {
    rx: mpsc::UnboundedReceiver<Result<InboundPayload, HubError>>,
}

pub fn inbound() -> (
    mpsc::UnboundedSender<Result<InboundPayload, HubError>>,
    ChannelInbound,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelInbound { rx })
}

#[async_trait]
impl InboundStream for ChannelInbound {
    async fn receive(&mut self) -> Result<InboundPayload, HubError> {
        match self.rx.recv().await {
            Some(result) => result,
            None => Err(HubError::transport_closed("client went away")),
        }
    }
}

/// 记录写出事件和关闭次数的写端
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<Event>,
    closes: Arc<AtomicUsize>,
    fail_writes: bool,
}

pub struct SinkMonitor {
    pub events: mpsc::UnboundedReceiver<Event>,
    closes: Arc<AtomicUsize>,
}

impl SinkMonitor {
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub fn sink() -> (RecordingSink, SinkMonitor) {
    build_sink(false)
}

/// 每次写入都失败的写端
pub fn broken_sink() -> (RecordingSink, SinkMonitor) {
    build_sink(true)
}

fn build_sink(fail_writes: bool) -> (RecordingSink, SinkMonitor) {
    let (tx, events) = mpsc::unbounded_channel();
    let closes = Arc::new(AtomicUsize::new(0));
    (
        RecordingSink {
            tx,
            closes: closes.clone(),
            fail_writes,
        },
        SinkMonitor { events, closes },
    )
}

#[async_trait]
impl OutboundSink for RecordingSink {
    async fn send(&mut self, event: &Event) -> Result<(), HubError> {
        if self.fail_writes {
            return Err(HubError::transport_closed("broken pipe"));
        }
        self.tx
            .send(event.clone())
            .map_err(|_| HubError::transport_closed("monitor dropped"))
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// 不允许任何上传的中枢
pub fn hub() -> Arc<ChatHub> {
    hub_with(MockObjectStore::new(), HubOptions::default())
}

pub fn hub_with(store: MockObjectStore, options: HubOptions) -> Arc<ChatHub> {
    Arc::new(ChatHub::new(Arc::new(store), options))
}

/// 等待下一条事件
pub async fn next_event(rx: &mut mpsc::Receiver<Event>) -> Event {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("outbound queue closed")
}

pub async fn next_written(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for written event")
        .expect("sink dropped")
}

/// 丢弃队列中已有的事件
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn assert_silent(rx: &mut mpsc::Receiver<Event>) {
    if let Ok(event) = rx.try_recv() {
        panic!("expected no event, got {event:?}");
    }
}

/// 轮询直到条件成立
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
