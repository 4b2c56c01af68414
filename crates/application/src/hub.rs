//! 聊天中枢
//!
//! 负责会话加入/离开的事件顺序、入站消息的路由和扇出，
//! 以及投递失败时的级联驱逐。

use std::sync::Arc;
use std::time::Duration;

use domain::identity_allocator::validate_requested;
use domain::{classify, Delivery, Dispatch, Event, HubError, Identity, InboundPayload, ObjectStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::SessionRegistry;
use crate::session::SessionHandle;
use crate::uploader::AttachmentUploader;

/// 中枢选项
#[derive(Debug, Clone)]
pub struct HubOptions {
    pub outbound_queue_capacity: usize,
    pub url_ttl: Duration,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: 64,
            url_ttl: Duration::from_secs(168 * 3600),
        }
    }
}

impl From<&config::AppConfig> for HubOptions {
    fn from(config: &config::AppConfig) -> Self {
        Self {
            outbound_queue_capacity: config.hub.outbound_queue_capacity,
            url_ttl: config.storage.url_ttl(),
        }
    }
}

/// 已加入的会话
#[derive(Debug)]
pub struct JoinedSession {
    pub handle: SessionHandle,
    pub identity: Identity,
    /// 出站队列接收端，由会话的写任务消费
    pub outbound: mpsc::Receiver<Event>,
}

/// 聊天中枢
pub struct ChatHub {
    registry: Arc<SessionRegistry>,
    uploader: AttachmentUploader,
    outbound_queue_capacity: usize,
    shutdown: CancellationToken,
}

impl ChatHub {
    pub fn new(store: Arc<dyn ObjectStore>, options: HubOptions) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            uploader: AttachmentUploader::new(store, options.url_ttl),
            outbound_queue_capacity: options.outbound_queue_capacity,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// 加入：分配身份、准入注册表、通知其他会话并广播在线列表
    pub async fn connect(&self, requested: &str) -> Result<JoinedSession, HubError> {
        let requested = validate_requested(requested)?;

        let (handle, outbound) =
            SessionHandle::new(self.outbound_queue_capacity, self.shutdown.child_token());
        let identity = self.registry.admit(handle.clone(), requested).await;
        handle.activate().await;

        let mut failed = self
            .fan_out(Some(&handle), Event::joined(&identity))
            .await;
        let roster = self.registry.roster().await;
        failed.extend(self.fan_out(None, Event::roster(roster)).await);
        self.evict_all(failed).await;

        Ok(JoinedSession {
            handle,
            identity,
            outbound,
        })
    }

    /// 处理一条入站消息
    pub async fn dispatch(&self, sender: &SessionHandle, payload: InboundPayload) {
        let from = match self.registry.identity_of(sender.id()).await {
            Ok(identity) => identity,
            Err(err) => {
                debug!(session_id = %sender.id(), error = %err, "会话已离开，丢弃消息");
                return;
            }
        };

        match classify(payload) {
            Dispatch::Empty => {
                let failed = self.fan_out(Some(sender), Event::empty(&from)).await;
                self.evict_all(failed).await;
            }
            Dispatch::Chat { text, delivery } => {
                self.deliver(sender, Event::chat(&from, text), delivery).await;
            }
            Dispatch::Image {
                attachment,
                delivery,
            } => match self.uploader.upload(attachment).await {
                Ok(url) => self.deliver(sender, Event::image(&from, url), delivery).await,
                Err(err) => {
                    warn!(from = %from, error = %err, "图片上传失败，消息已丢弃");
                }
            },
        }
    }

    /// 服务器通知，发给所有会话
    pub async fn announce(&self, text: impl Into<String>) {
        let failed = self.fan_out(None, Event::system(text)).await;
        self.evict_all(failed).await;
    }

    /// 离开：唯一的清理路径，重复调用是安全的
    pub async fn leave(&self, session: &SessionHandle) {
        self.evict_all(vec![session.clone()]).await;
    }

    /// 取消所有会话
    pub fn shutdown(&self) {
        info!("聊天中枢正在停止");
        self.shutdown.cancel();
    }

    pub async fn roster(&self) -> Vec<Identity> {
        self.registry.roster().await
    }

    async fn deliver(&self, sender: &SessionHandle, event: Event, delivery: Delivery) {
        match delivery {
            Delivery::Broadcast => {
                log_content(&event, None);
                let failed = self.fan_out(Some(sender), event).await;
                self.evict_all(failed).await;
            }
            Delivery::Direct(target) => {
                let Some(recipient) = self.registry.resolve(&target, sender.id()).await else {
                    debug!(from = %event.from, target = %target, "接收者不在线，消息已丢弃");
                    return;
                };
                log_content(&event, Some(&target));
                if let Err(err) = recipient.deliver(event) {
                    warn!(error = %err, "私聊投递失败");
                    self.evict_all(vec![recipient]).await;
                }
            }
        }
    }

    /// 向快照中的每个会话投递，返回投递失败的会话
    async fn fan_out(&self, exclude: Option<&SessionHandle>, event: Event) -> Vec<SessionHandle> {
        let recipients = self
            .registry
            .recipients(exclude.map(SessionHandle::id))
            .await;

        let mut failed = Vec::new();
        for recipient in recipients {
            if let Err(err) = recipient.deliver(event.clone()) {
                warn!(error = %err, kind = ?event.kind, "扇出投递失败");
                failed.push(recipient);
            }
        }
        failed
    }

    /// 逐个驱逐，驱逐时广播的 `Left` 再失败的会话继续排队处理
    async fn evict_all(&self, mut pending: Vec<SessionHandle>) {
        while let Some(session) = pending.pop() {
            pending.extend(self.depart(&session).await);
        }
    }

    /// `Leaving -> Closed`
    async fn depart(&self, session: &SessionHandle) -> Vec<SessionHandle> {
        if !session.begin_leaving().await {
            return Vec::new();
        }

        // 先记下身份再移除
        let identity = match self.registry.identity_of(session.id()).await {
            Ok(identity) => Some(identity),
            Err(err) => {
                warn!(error = %err, "会话已被清理");
                None
            }
        };
        self.registry.remove(session.id()).await;
        session.cancel();
        session.mark_closed().await;

        match identity {
            Some(identity) => {
                info!(session_id = %session.id(), identity = %identity, "会话已离开");
                self.fan_out(Some(session), Event::left(&identity)).await
            }
            None => Vec::new(),
        }
    }
}

fn log_content(event: &Event, target: Option<&Identity>) {
    if !event.kind.carries_content() {
        return;
    }
    let content = event.message.as_text().unwrap_or_default();
    match target {
        Some(target) => info!(from = %event.from, to = %target, kind = ?event.kind, content, "私聊消息已发送"),
        None => info!(from = %event.from, kind = ?event.kind, content, "广播消息已发送"),
    }
}
