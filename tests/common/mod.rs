//! Shared utilities for relay integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use bench_relay::config::store::ConfigStore;
use bench_relay::lifecycle::Shutdown;
use bench_relay::net::connection::ConnectionTracker;
use bench_relay::net::control::serve_control;
use bench_relay::net::listener::Listener;
use bench_relay::net::session::serve_clients;

/// A mock destination node bound to an ephemeral port.
///
/// Records every byte it receives; optionally writes a scripted reply after
/// the first read on each accepted connection.
pub struct MockNode {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<u8>>>,
}

impl MockNode {
    pub async fn start(reply: Option<&'static [u8]>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((mut socket, _)) => {
                        let sink = sink.clone();
                        tokio::spawn(async move {
                            let mut buf = [0u8; 4096];
                            let mut replied = false;
                            loop {
                                match socket.read(&mut buf).await {
                                    Ok(0) | Err(_) => break,
                                    Ok(n) => {
                                        sink.lock().await.extend_from_slice(&buf[..n]);
                                        if !replied {
                                            if let Some(reply) = reply {
                                                let _ = socket.write_all(reply).await;
                                            }
                                            replied = true;
                                        }
                                    }
                                }
                            }
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, received }
    }

    /// Bytes received so far, across all connections.
    pub async fn received(&self) -> Vec<u8> {
        self.received.lock().await.clone()
    }

    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }
}

/// An in-process relay with both listeners on ephemeral ports.
pub struct TestRelay {
    pub client_addr: SocketAddr,
    pub control_addr: SocketAddr,
    pub store: Arc<ConfigStore>,
    pub shutdown: Arc<Shutdown>,
    pub tracker: ConnectionTracker,
}

#[allow(dead_code)]
pub async fn start_relay() -> TestRelay {
    let store = Arc::new(ConfigStore::new());
    let shutdown = Arc::new(Shutdown::new());
    let tracker = ConnectionTracker::new();

    let client_listener = Listener::bind("127.0.0.1:0", 64).await.unwrap();
    let control_listener = Listener::bind("127.0.0.1:0", 64).await.unwrap();
    let client_addr = client_listener.local_addr().unwrap();
    let control_addr = control_listener.local_addr().unwrap();

    tokio::spawn(serve_control(
        control_listener,
        Arc::clone(&store),
        shutdown.subscribe(),
    ));
    tokio::spawn(serve_clients(
        client_listener,
        Arc::clone(&store),
        tracker.clone(),
        Arc::clone(&shutdown),
    ));

    TestRelay {
        client_addr,
        control_addr,
        store,
        shutdown,
        tracker,
    }
}
