//! Client-session handling: the relay's data path.
//!
//! # Responsibilities
//! - Snapshot the routing table once per accepted client connection
//! - Dial every destination, all-or-nothing
//! - Fan client bytes out to all destinations; fan the response node's bytes
//!   (and only those) back to the client
//! - Tear the whole session down as soon as either direction finishes
//!
//! # Design Decisions
//! - Forwarding tasks are owned `JoinHandle`s: the session is not closed
//!   until both are joined or cancelled, so slow peers cannot leak tasks
//! - Completion is a single-slot channel; the first direction to finish
//!   wins and the other is aborted
//! - A read/write error mid-stream is that direction's completion signal,
//!   never fatal beyond the session

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tracing::Instrument;

use crate::config::schema::RoutingTable;
use crate::config::store::ConfigStore;
use crate::lifecycle::Shutdown;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::Listener;

/// Copy buffer size for both forwarding directions.
const COPY_BUFFER: usize = 8192;

/// Errors that abort a session before any byte is relayed.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A configured destination was unreachable at session start.
    #[error("failed to dial destination {addr}: {source}")]
    Dial {
        addr: String,
        source: std::io::Error,
    },
}

/// Which forwarding direction finished first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    ClientToNodes,
    NodeToClient,
}

/// Accept loop for client connections.
///
/// The routing table is snapshotted here, at accept time; a `set` landing
/// after the snapshot affects only later sessions. Returns when the shutdown
/// signal fires; in-flight sessions observe the same signal and cancel.
pub async fn serve_clients(
    listener: Listener,
    store: Arc<ConfigStore>,
    tracker: ConnectionTracker,
    shutdown: Arc<Shutdown>,
) {
    let mut shutdown_rx = shutdown.subscribe();
    loop {
        let accepted = tokio::select! {
            res = listener.accept() => res,
            _ = shutdown_rx.recv() => {
                tracing::info!("Client listener stopping");
                return;
            }
        };

        match accepted {
            Ok((stream, peer_addr, permit)) => {
                let table = store.get();
                let guard = tracker.track();
                let id = guard.id();
                let session_shutdown = shutdown.subscribe();
                tokio::spawn(
                    async move {
                        if let Err(e) =
                            handle_client_connection(stream, peer_addr, table, session_shutdown)
                                .await
                        {
                            tracing::warn!(error = %e, "Session aborted");
                        }
                        drop(guard);
                        drop(permit);
                    }
                    .instrument(tracing::info_span!("session", id = %id, peer = %peer_addr)),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Accept error on client listener");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

/// Relay one client connection against a fixed routing-table snapshot.
///
/// Runs the session state machine to completion: dial, relay, teardown. All
/// sockets are closed by the time this returns, whichever direction ended
/// first and however it ended.
pub async fn handle_client_connection(
    client: TcpStream,
    peer_addr: SocketAddr,
    table: RoutingTable,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), SessionError> {
    let destinations = table.destinations.as_deref().unwrap_or_default();
    if destinations.is_empty() {
        tracing::debug!("No destinations configured, closing client");
        return Ok(());
    }

    // Connecting: dial in table order, all-or-nothing. A failure drops the
    // client socket and every destination already dialed.
    let mut node_streams = Vec::with_capacity(destinations.len());
    for endpoint in destinations {
        let stream = TcpStream::connect(endpoint.addr.as_str())
            .await
            .map_err(|source| SessionError::Dial {
                addr: endpoint.addr.clone(),
                source,
            })?;
        node_streams.push(stream);
    }

    let response_index = destinations
        .iter()
        .position(|d| d.addr == table.response_source);

    let (client_read, client_write) = client.into_split();

    let mut node_writers = Vec::with_capacity(node_streams.len());
    let mut response_reader = None;
    for (i, stream) in node_streams.into_iter().enumerate() {
        let (read_half, write_half) = stream.into_split();
        if Some(i) == response_index {
            response_reader = Some(read_half);
        }
        node_writers.push(write_half);
    }

    tracing::debug!(
        destinations = node_writers.len(),
        response_source = %table.response_source,
        "Relaying"
    );

    let (done_tx, mut done_rx) = mpsc::channel::<Direction>(1);

    let fan_out = {
        let done = done_tx.clone();
        let mut client_read = client_read;
        let mut node_writers = node_writers;
        tokio::spawn(
            async move {
                let mut buf = vec![0u8; COPY_BUFFER];
                let mut total = 0u64;
                'relay: loop {
                    match client_read.read(&mut buf).await {
                        Ok(0) => break,
                        Ok(n) => {
                            for writer in node_writers.iter_mut() {
                                if let Err(e) = writer.write_all(&buf[..n]).await {
                                    tracing::debug!(error = %e, "Destination write failed");
                                    break 'relay;
                                }
                            }
                            total += n as u64;
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "Client read failed");
                            break;
                        }
                    }
                }
                for writer in node_writers.iter_mut() {
                    let _ = writer.shutdown().await;
                }
                tracing::debug!(bytes = total, "Client to nodes finished");
                let _ = done.send(Direction::ClientToNodes).await;
            }
            .in_current_span(),
        )
    };

    // The client's write half is either driven by the fan-in task or parked
    // here so the connection stays open until teardown.
    let mut parked_client_write = None;
    let fan_in = match response_reader {
        Some(mut reader) => {
            let done = done_tx.clone();
            let mut client_write = client_write;
            Some(tokio::spawn(
                async move {
                    let mut buf = vec![0u8; COPY_BUFFER];
                    let mut total = 0u64;
                    loop {
                        match reader.read(&mut buf).await {
                            Ok(0) => break,
                            Ok(n) => {
                                if let Err(e) = client_write.write_all(&buf[..n]).await {
                                    tracing::debug!(error = %e, "Client write failed");
                                    break;
                                }
                                total += n as u64;
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "Response node read failed");
                                break;
                            }
                        }
                    }
                    let _ = client_write.shutdown().await;
                    tracing::debug!(bytes = total, "Node to client finished");
                    let _ = done.send(Direction::NodeToClient).await;
                }
                .in_current_span(),
            ))
        }
        None => {
            parked_client_write = Some(client_write);
            None
        }
    };
    drop(done_tx);

    // Relaying ends when either direction finishes or the process shuts
    // down; the relay's job is done once either side closes.
    tokio::select! {
        direction = done_rx.recv() => {
            tracing::debug!(finished = ?direction, peer = %peer_addr, "Session closing");
        }
        _ = shutdown.recv() => {
            tracing::debug!(peer = %peer_addr, "Session cancelled by shutdown");
        }
    }

    // Closing: cancel the surviving task(s) and join both before the session
    // counts as closed. Dropping the halves closes every socket.
    fan_out.abort();
    let _ = fan_out.await;
    if let Some(task) = fan_in {
        task.abort();
        let _ = task.await;
    }
    drop(parked_client_write);

    Ok(())
}
