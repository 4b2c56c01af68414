//! 连接生命周期测试
//!
//! 通过内存传输运行完整的会话任务，验证读错误、关闭、驱逐和停机路径。

mod support;

use std::time::Duration;

use application::{run_session, SessionState};
use domain::{Event, EventKind, HubError, Identity, InboundPayload};
use support::{broken_sink, drain, eventually, hub, inbound, next_event, next_written, sink};
use tokio::time::timeout;

#[tokio::test]
async fn malformed_frame_keeps_session_active() {
    let hub = hub();
    let mut peer = hub.connect("bob").await.unwrap();

    let joined = hub.connect("alice").await.unwrap();
    let alice = joined.handle.clone();
    let (tx, reader) = inbound();
    let (writer, mut monitor) = sink();
    let task = tokio::spawn(run_session(hub.clone(), joined, reader, writer));

    // alice 自己的在线列表由写任务写出
    assert_eq!(next_written(&mut monitor.events).await.kind, EventKind::RosterUpdate);
    drain(&mut peer.outbound);

    tx.send(Err(HubError::transport_read("expected value at line 1 column 1")))
        .unwrap();
    tx.send(Ok(InboundPayload::text("still here"))).unwrap();

    assert_eq!(
        next_event(&mut peer.outbound).await,
        Event::chat(&Identity::from("alice"), "still here")
    );
    assert_eq!(alice.state().await, SessionState::Active);
    assert!(hub.registry().contains(alice.id()).await);

    drop(tx);
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn close_signal_leaves_and_closes_once() {
    let hub = hub();
    let mut peer = hub.connect("bob").await.unwrap();

    let joined = hub.connect("alice").await.unwrap();
    let alice = joined.handle.clone();
    let (tx, reader) = inbound();
    let (writer, monitor) = sink();
    let task = tokio::spawn(run_session(hub.clone(), joined, reader, writer));
    drain(&mut peer.outbound);

    tx.send(Err(HubError::transport_closed("close frame"))).unwrap();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap();

    assert_eq!(
        drain(&mut peer.outbound),
        vec![Event::left(&Identity::from("alice"))]
    );
    assert!(!hub.registry().contains(alice.id()).await);
    assert_eq!(alice.state().await, SessionState::Closed);
    assert_eq!(monitor.close_count(), 1);

    // 再次清理不会产生新的事件
    hub.leave(&alice).await;
    assert!(drain(&mut peer.outbound).is_empty());
    assert_eq!(monitor.close_count(), 1);
}

#[tokio::test]
async fn external_eviction_stops_the_receive_loop() {
    let hub = hub();
    let mut peer = hub.connect("bob").await.unwrap();

    let joined = hub.connect("alice").await.unwrap();
    let alice = joined.handle.clone();
    let (_tx, reader) = inbound();
    let (writer, monitor) = sink();
    let task = tokio::spawn(run_session(hub.clone(), joined, reader, writer));
    drain(&mut peer.outbound);

    // 模拟扇出路径和读路径同时清理
    hub.leave(&alice).await;
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap();

    assert_eq!(
        drain(&mut peer.outbound),
        vec![Event::left(&Identity::from("alice"))]
    );
    assert_eq!(monitor.close_count(), 1);
    assert_eq!(hub.registry().len().await, 1);
}

#[tokio::test]
async fn write_failure_evicts_session() {
    let hub = hub();
    let mut peer = hub.connect("bob").await.unwrap();

    let joined = hub.connect("alice").await.unwrap();
    let alice = joined.handle.clone();
    let (_tx, reader) = inbound();
    let (writer, monitor) = broken_sink();
    let task = tokio::spawn(run_session(hub.clone(), joined, reader, writer));

    // 写出 alice 自己的在线列表时就会失败
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap();

    let registry = hub.registry().clone();
    let alice_id = alice.id();
    eventually(|| {
        let registry = registry.clone();
        async move { !registry.contains(alice_id).await }
    })
    .await;

    let events = drain(&mut peer.outbound);
    assert_eq!(events.last(), Some(&Event::left(&Identity::from("alice"))));
    assert_eq!(monitor.close_count(), 1);
}

#[tokio::test]
async fn shutdown_flushes_announcement_and_ends_sessions() {
    let hub = hub();

    let mut tasks = Vec::new();
    let mut monitors = Vec::new();
    for name in ["alice", "bob"] {
        let joined = hub.connect(name).await.unwrap();
        let (tx, reader) = inbound();
        let (writer, monitor) = sink();
        tasks.push((
            tx,
            tokio::spawn(run_session(hub.clone(), joined, reader, writer)),
        ));
        monitors.push(monitor);
    }

    hub.announce("server is shutting down").await;
    hub.shutdown();

    for (_tx, task) in tasks {
        timeout(Duration::from_secs(3), task).await.unwrap().unwrap();
    }

    for monitor in monitors.iter_mut() {
        let mut written = Vec::new();
        while let Ok(event) = monitor.events.try_recv() {
            written.push(event);
        }
        assert!(written.contains(&Event::system("server is shutting down")));
        assert_eq!(monitor.close_count(), 1);
    }
    assert!(hub.registry().is_empty().await);
}
