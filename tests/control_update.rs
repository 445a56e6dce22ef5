//! End-to-end tests for the control channel.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

mod common;

/// Deliver one control payload the way relay-cli does: write, close the
/// write side, done.
async fn send_control(addr: std::net::SocketAddr, payload: &[u8]) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(payload).await.unwrap();
    stream.shutdown().await.unwrap();
}

#[tokio::test]
async fn control_update_takes_effect_end_to_end() {
    let relay = common::start_relay().await;
    let node_a = common::MockNode::start(None).await;
    let node_b = common::MockNode::start(Some(b"pong")).await;

    let payload = format!(
        r#"{{"nodes":[{{"addr":"{a}"}},{{"addr":"{b}"}}],"responseNodeAddr":"{b}"}}"#,
        a = node_a.addr_string(),
        b = node_b.addr_string(),
    );
    send_control(relay.control_addr, payload.as_bytes()).await;
    sleep(Duration::from_millis(100)).await;

    let installed = relay.store.get();
    assert_eq!(installed.response_source, node_b.addr_string());

    // Ping fans out to A and B; only B's pong comes back.
    let mut client = TcpStream::connect(relay.client_addr).await.unwrap();
    client.write_all(b"ping").await.unwrap();

    let mut reply = [0u8; 4];
    timeout(Duration::from_secs(2), client.read_exact(&mut reply))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&reply, b"pong");
    assert_eq!(node_a.received().await, b"ping");
    assert_eq!(node_b.received().await, b"ping");
}

#[tokio::test]
async fn invalid_update_keeps_previous_table() {
    let relay = common::start_relay().await;
    let prior = br#"{"nodes":[{"addr":"127.0.0.1:9001"}],"responseNodeAddr":""}"#;
    send_control(relay.control_addr, prior).await;
    sleep(Duration::from_millis(100)).await;
    let prior_table = relay.store.get();
    assert_eq!(prior_table.destinations.as_ref().unwrap().len(), 1);

    // Response source not among the destinations.
    send_control(
        relay.control_addr,
        br#"{"nodes":[{"addr":"127.0.0.1:9001"}],"responseNodeAddr":"127.0.0.1:9999"}"#,
    )
    .await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(relay.store.get(), prior_table);

    // Not JSON at all.
    send_control(relay.control_addr, b"{oops").await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(relay.store.get(), prior_table);
}

#[tokio::test]
async fn oversized_control_message_is_rejected() {
    let relay = common::start_relay().await;
    let prior_table = relay.store.get();

    let payload = vec![b'x'; 80 * 1024];
    send_control(relay.control_addr, &payload).await;
    sleep(Duration::from_millis(200)).await;

    assert_eq!(relay.store.get(), prior_table);
}

#[tokio::test]
async fn updates_spanning_multiple_segments_are_reassembled() {
    let relay = common::start_relay().await;

    // Write the payload in two chunks with a pause between them; EOF framing
    // must reassemble it.
    let payload = br#"{"nodes":[{"addr":"127.0.0.1:9001"},{"addr":"127.0.0.1:9002"}],"responseNodeAddr":"127.0.0.1:9002"}"#;
    let (head, tail) = payload.split_at(payload.len() / 2);

    let mut stream = TcpStream::connect(relay.control_addr).await.unwrap();
    stream.write_all(head).await.unwrap();
    stream.flush().await.unwrap();
    sleep(Duration::from_millis(100)).await;
    stream.write_all(tail).await.unwrap();
    stream.shutdown().await.unwrap();
    sleep(Duration::from_millis(100)).await;

    let installed = relay.store.get();
    assert_eq!(installed.destinations.as_ref().unwrap().len(), 2);
    assert_eq!(installed.response_source, "127.0.0.1:9002");
}
