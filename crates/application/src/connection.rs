//! 连接生命周期管理
//!
//! 把一个传输会话绑定到中枢：写任务把出站队列写入连接，
//! 接收循环把入站消息交给路由器，任何终止路径最后都汇入 `ChatHub::leave`。

use std::sync::Arc;
use std::time::Duration;

use domain::{Event, InboundStream, OutboundSink};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::hub::{ChatHub, JoinedSession};
use crate::session::SessionHandle;

/// 取消后把已排队事件写出的最长时间
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// 运行一个会话直到它结束
pub async fn run_session<I, O>(hub: Arc<ChatHub>, joined: JoinedSession, mut inbound: I, outbound: O)
where
    I: InboundStream,
    O: OutboundSink + 'static,
{
    let JoinedSession {
        handle,
        identity,
        outbound: queue,
    } = joined;

    info!(session_id = %handle.id(), identity = %identity, "WebSocket 会话开始");

    let writer = tokio::spawn(write_loop(hub.clone(), handle.clone(), queue, outbound));

    let token = handle.shutdown_token().clone();
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(session_id = %handle.id(), "接收循环已取消");
                break;
            }
            received = inbound.receive() => match received {
                Ok(payload) => hub.dispatch(&handle, payload).await,
                Err(err) if err.is_terminal() => {
                    info!(session_id = %handle.id(), identity = %identity, reason = %err, "连接已关闭");
                    break;
                }
                Err(err) => {
                    warn!(session_id = %handle.id(), error = %err, "读取消息失败");
                }
            }
        }
    }

    hub.leave(&handle).await;

    if let Err(err) = writer.await {
        warn!(session_id = %handle.id(), error = %err, "写任务异常退出");
    }
    info!(session_id = %handle.id(), identity = %identity, "WebSocket 会话结束");
}

/// 写任务：唯一持有写端的地方，退出时关闭连接
async fn write_loop<O>(
    hub: Arc<ChatHub>,
    handle: SessionHandle,
    mut queue: mpsc::Receiver<Event>,
    mut sink: O,
) where
    O: OutboundSink,
{
    let token = handle.shutdown_token().clone();
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                if tokio::time::timeout(FLUSH_TIMEOUT, flush(&mut queue, &mut sink)).await.is_err() {
                    debug!(session_id = %handle.id(), "写出剩余事件超时");
                }
                break;
            }
            next = queue.recv() => {
                let Some(event) = next else { break };
                if let Err(err) = sink.send(&event).await {
                    warn!(session_id = %handle.id(), error = %err, "写出事件失败，驱逐会话");
                    hub.leave(&handle).await;
                    break;
                }
            }
        }
    }
    sink.close().await;
}

/// 写出队列里剩余的事件，遇到第一个错误就停止
async fn flush<O: OutboundSink>(queue: &mut mpsc::Receiver<Event>, sink: &mut O) {
    while let Ok(event) = queue.try_recv() {
        if sink.send(&event).await.is_err() {
            break;
        }
    }
}
