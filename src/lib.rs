//! Man-in-the-middle TCP relay for a benchmarking testbed.
//!
//! The relay sits between a client and a set of destination nodes. Client
//! bytes are fanned out to every destination; only the configured response
//! node's bytes flow back. The routing table is replaced at runtime over a
//! separate control channel, without restarting the relay.
//!
//! ```text
//!                       ┌─────────────────────────────────────┐
//!                       │              bench-relay            │
//!                       │                                     │
//!     client ──────────▶│ client listener ──▶ session ────────┼──▶ node A
//!            ◀──────────│          (fixed table snapshot) ────┼──▶ node B (response)
//!                       │                                     │
//!     relay-cli ───────▶│ control listener ──▶ ConfigStore    │
//!                       │                      (current table)│
//!                       └─────────────────────────────────────┘
//! ```
//!
//! A new routing table affects only sessions accepted after the update;
//! in-flight sessions keep relaying to the destinations they were dialed
//! against.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::{Endpoint, RoutingTable};
pub use config::store::ConfigStore;
pub use lifecycle::Shutdown;
