//! Control-channel handling.
//!
//! # Responsibilities
//! - Accept control connections and read one routing-table update per
//!   connection
//! - Hand the payload to the store; log and drop the connection on any
//!   failure, with no state change
//!
//! # Design Decisions
//! - EOF-framed messages: the controller closes its write side after
//!   sending, so read-to-EOF sees the complete payload even when it spans
//!   several TCP segments
//! - Handlers are stateless; all mutation goes through the store's
//!   synchronized `set`, so any number may run concurrently

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::store::{ConfigError, ConfigStore};
use crate::net::listener::Listener;

/// Upper bound on a control message. A routing table for a testbed is a few
/// hundred bytes; anything near this limit is garbage.
pub const MAX_CONTROL_MESSAGE: usize = 64 * 1024;

/// Errors from a single control connection.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Failed to read the control payload.
    #[error("control read failed: {0}")]
    Read(#[from] std::io::Error),

    /// Payload exceeded [`MAX_CONTROL_MESSAGE`].
    #[error("control message exceeds {MAX_CONTROL_MESSAGE} bytes")]
    TooLarge,

    /// Payload failed parsing or validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Accept loop for control connections. Spawns one handler task per
/// connection; returns when the shutdown signal fires.
pub async fn serve_control(
    listener: Listener,
    store: Arc<ConfigStore>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let accepted = tokio::select! {
            res = listener.accept() => res,
            _ = shutdown.recv() => {
                tracing::info!("Control listener stopping");
                return;
            }
        };

        match accepted {
            Ok((stream, peer_addr, permit)) => {
                let store = Arc::clone(&store);
                tokio::spawn(
                    async move {
                        if let Err(e) = handle_control_connection(stream, &store).await {
                            tracing::warn!(error = %e, "Control update rejected");
                        }
                        drop(permit);
                    }
                    .instrument(tracing::info_span!("control", peer = %peer_addr)),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Accept error on control listener");
                // Brief sleep to avoid a tight loop on persistent errors
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

/// Handle one control connection: read the whole payload, parse it, install
/// it. Any failure leaves the current table untouched.
pub async fn handle_control_connection(
    stream: TcpStream,
    store: &ConfigStore,
) -> Result<(), ControlError> {
    let mut payload = Vec::new();
    let read = stream
        .take(MAX_CONTROL_MESSAGE as u64 + 1)
        .read_to_end(&mut payload)
        .await?;
    if read > MAX_CONTROL_MESSAGE {
        return Err(ControlError::TooLarge);
    }

    let table = store.parse_and_set(&payload)?;
    tracing::info!(table = %table, "Routing table updated");
    Ok(())
}
