//! Controller CLI for bench-relay.
//!
//! Serializes a routing-table update and delivers it over one short-lived
//! control connection. The write side is closed after sending; the relay
//! reads to EOF, so no framing is needed.

use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use bench_relay::config::schema::{Endpoint, RoutingTable};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Controller CLI for the bench-relay routing table", long_about = None)]
struct Cli {
    /// Control address of the relay (host:port).
    #[arg(short, long, default_value = "127.0.0.1:8001")]
    relay: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the relay's routing table
    ChangeFlow {
        /// Destination address client traffic is fanned out to (repeatable).
        #[arg(long = "destination-node", value_name = "ADDR")]
        destination_nodes: Vec<String>,

        /// Destination whose response is relayed back to the client.
        #[arg(long = "response-node", value_name = "ADDR")]
        response_node: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ChangeFlow {
            destination_nodes,
            response_node,
        } => {
            let table = RoutingTable {
                destinations: Some(
                    destination_nodes
                        .into_iter()
                        .map(|addr| Endpoint { addr })
                        .collect(),
                ),
                response_source: response_node.unwrap_or_default(),
            };

            // Catch bad updates here; the relay would reject them with no
            // feedback on this side of the wire.
            if !table.is_valid() {
                eprintln!("Error: response node must be one of the destination nodes");
                std::process::exit(1);
            }

            let payload = serde_json::to_vec(&table)?;
            let mut stream = TcpStream::connect(&cli.relay).await?;
            stream.write_all(&payload).await?;
            stream.shutdown().await?;

            println!("Routing table sent to {}: {}", cli.relay, table);
        }
    }

    Ok(())
}
