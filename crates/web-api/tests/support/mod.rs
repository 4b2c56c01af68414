use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{ChatHub, HubOptions};
use futures_util::StreamExt;
use infrastructure::{LocalObjectStore, UrlSigner};
use serde_json::Value;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    time::timeout,
};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as TungsteniteMessage, MaybeTlsStream, WebSocketStream,
};
use web_api::{router, AppState};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const SECRET: &str = "web-api-test-secret-with-32-bytes!";

pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: Arc<ChatHub>,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, username: &str) -> String {
        format!("ws://{}/ws?username={}", self.addr, username)
    }

    pub async fn connect(&self, username: &str) -> Client {
        let (client, _) = connect_async(self.ws_url(username))
            .await
            .expect("websocket connect");
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.hub.shutdown();
    }
}

pub fn build_state(base_url: &str) -> AppState {
    let options = HubOptions::default();
    let store = Arc::new(LocalObjectStore::in_memory(
        UrlSigner::new(SECRET.as_bytes(), base_url),
        options.url_ttl,
    ));
    let hub = Arc::new(ChatHub::new(store.clone(), options));
    AppState::new(hub, store)
}

pub async fn spawn_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = build_state(&format!("http://{addr}"));
    let app = router(state.clone());
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    TestServer {
        addr,
        hub: state.hub.clone(),
        state,
        shutdown: Some(shutdown_tx),
    }
}

/// 读取下一条 JSON 文本帧
pub async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        match frame {
            TungsteniteMessage::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("json frame")
            }
            TungsteniteMessage::Ping(_) | TungsteniteMessage::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// 读取直到出现指定类型的事件
pub async fn next_of_type(client: &mut Client, kind: &str) -> Value {
    loop {
        let event = next_json(client).await;
        if event["type"] == kind {
            return event;
        }
    }
}

/// 确认短时间内没有新的帧
pub async fn assert_quiet(client: &mut Client) {
    let result = timeout(Duration::from_millis(150), client.next()).await;
    assert!(result.is_err(), "unexpected frame: {result:?}");
}

pub fn roster_names(event: &Value) -> Vec<String> {
    let mut names: Vec<String> = event["message"]
        .as_array()
        .expect("roster array")
        .iter()
        .map(|name| name.as_str().expect("name").to_string())
        .collect();
    names.sort();
    names
}
