//! 会话句柄与生命周期状态
//!
//! 注册表和路由器只持有句柄的克隆，传输连接本身归会话任务所有。

use std::sync::Arc;

use domain::{Event, HubError, SessionId};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// 会话状态机：`Joining -> Active -> Leaving -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Joining,
    Active,
    Leaving,
    Closed,
}

/// 会话句柄
///
/// 每个会话一个有界出站队列，扇出时使用 `try_send`，
/// 一个卡住的会话不会拖慢对其他会话的投递。
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    outbound: mpsc::Sender<Event>,
    state: Arc<Mutex<SessionState>>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    /// 创建句柄及其出站队列的接收端
    pub fn new(capacity: usize, shutdown: CancellationToken) -> (Self, mpsc::Receiver<Event>) {
        let (outbound, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: SessionId::new(),
            outbound,
            state: Arc::new(Mutex::new(SessionState::Joining)),
            shutdown,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// 把事件放入出站队列，不等待
    ///
    /// 队列已满或已关闭都视为投递失败。
    pub fn deliver(&self, event: Event) -> Result<(), HubError> {
        self.outbound.try_send(event).map_err(|err| {
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "outbound queue full",
                mpsc::error::TrySendError::Closed(_) => "outbound queue closed",
            };
            HubError::delivery_failure(self.id, reason)
        })
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// `Joining -> Active`
    pub async fn activate(&self) -> bool {
        let mut state = self.state.lock().await;
        if *state == SessionState::Joining {
            *state = SessionState::Active;
            true
        } else {
            false
        }
    }

    /// 进入 `Leaving`，只有第一次调用返回 `true`
    ///
    /// 读错误路径和扇出驱逐路径可能同时触发，这里保证清理只执行一次。
    pub async fn begin_leaving(&self) -> bool {
        let mut state = self.state.lock().await;
        match *state {
            SessionState::Joining | SessionState::Active => {
                *state = SessionState::Leaving;
                true
            }
            SessionState::Leaving | SessionState::Closed => false,
        }
    }

    pub async fn mark_closed(&self) {
        *self.state.lock().await = SessionState::Closed;
    }

    /// 取消会话的接收循环和写任务
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
