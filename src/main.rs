//! Relay daemon entry point.
//!
//! Binds two independent listeners sharing one [`ConfigStore`]: one for
//! client (data) traffic, one for control connections. Malformed arguments
//! and bind failures terminate the process; everything else is confined to
//! the connection it happened on.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use bench_relay::config::store::ConfigStore;
use bench_relay::lifecycle::{signals, Shutdown};
use bench_relay::net::connection::ConnectionTracker;
use bench_relay::net::control;
use bench_relay::net::listener::Listener;
use bench_relay::net::session;

/// MITM TCP relay with a runtime-updatable routing table.
#[derive(Parser)]
#[command(name = "bench-relay", version)]
struct Args {
    /// Address to bind both listeners on (e.g. 127.0.0.1).
    bind_address: String,

    /// Port for client (data) connections.
    client_port: u16,

    /// Port for control connections.
    control_port: u16,

    /// Maximum concurrent connections per listener.
    #[arg(long, default_value_t = 10_000)]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    bench_relay::observability::logging::init_logging();

    let args = Args::parse();
    let client_addr = format!("{}:{}", args.bind_address, args.client_port);
    let control_addr = format!("{}:{}", args.bind_address, args.control_port);

    tracing::info!(
        client_addr = %client_addr,
        control_addr = %control_addr,
        max_connections = args.max_connections,
        "bench-relay starting"
    );

    let store = Arc::new(ConfigStore::new());
    let shutdown = Arc::new(Shutdown::new());
    let tracker = ConnectionTracker::new();

    // Bind both listeners before serving anything; bind failures are fatal.
    let control_listener = Listener::bind(&control_addr, args.max_connections).await?;
    let client_listener = Listener::bind(&client_addr, args.max_connections).await?;

    tokio::spawn(signals::shutdown_on_signal(Arc::clone(&shutdown)));
    tokio::spawn(control::serve_control(
        control_listener,
        Arc::clone(&store),
        shutdown.subscribe(),
    ));

    session::serve_clients(client_listener, store, tracker.clone(), Arc::clone(&shutdown)).await;

    // In-flight sessions observe the same shutdown signal; give them a
    // moment to cancel and close their sockets.
    tokio::select! {
        _ = tracker.wait_idle() => {
            tracing::info!("All sessions drained");
        }
        _ = tokio::time::sleep(Duration::from_secs(5)) => {
            tracing::warn!(active = tracker.active_count(), "Drain deadline reached");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
