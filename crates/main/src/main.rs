//! 主应用程序入口
//!
//! 加载配置，构建对象存储和聊天中枢，启动 Axum Web 服务。

use std::{sync::Arc, time::Duration};

use application::{ChatHub, HubOptions};
use config::AppConfig;
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

/// 停机时等待会话清理完成的最长时间
const DRAIN_TIMEOUT: Duration = Duration::from_secs(3);

const SHUTDOWN_NOTICE: &str = "Server is shutting down";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load()?;
    if config.storage.uses_development_secret() {
        tracing::warn!("使用开发环境签名密钥，请设置 APP_STORAGE__SIGNING_SECRET");
    }

    let infra = Infrastructure::build(&config.storage).await?;
    tracing::info!(backend = ?config.storage.backend, "附件存储已就绪");

    let hub = Arc::new(ChatHub::new(
        infra.object_store.clone(),
        HubOptions::from(&config),
    ));
    let state = AppState::new(hub.clone(), infra.object_store);

    let app = router(state);
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("聊天服务器启动在 http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub.clone()))
        .await?;

    drain_sessions(&hub).await;
    tracing::info!("服务器已停止");
    Ok(())
}

/// 收到 Ctrl-C 后通知所有会话并取消会话任务
async fn shutdown_signal(hub: Arc<ChatHub>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听停机信号");
        std::future::pending::<()>().await;
    }
    tracing::info!("收到停机信号");
    hub.announce(SHUTDOWN_NOTICE).await;
    hub.shutdown();
}

async fn drain_sessions(hub: &ChatHub) {
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while !hub.registry().is_empty().await {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    if drained.is_err() {
        let remaining = hub.registry().len().await;
        tracing::warn!(remaining, "部分会话未能在停机前完成清理");
    }
}
