//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Control connection
//!     → listener.rs (accept, connection limits)
//!     → control.rs (bounded read-to-EOF, parse, install)
//!     → ConfigStore
//!
//! Client connection
//!     → listener.rs (accept, connection limits)
//!     → ConfigStore.get (snapshot at accept time)
//!     → session.rs (dial all destinations, fan-out / fan-in, teardown)
//!
//! Session states:
//!     Accepted → Snapshotted → Connecting → Relaying → Closing → Closed
//! ```
//!
//! # Design Decisions
//! - The two accept loops are independent; control and client paths never
//!   block each other
//! - Destination setup is all-or-nothing: one failed dial aborts the session
//!   before any byte is relayed
//! - The first forwarding direction to finish triggers teardown of the whole
//!   session; the other direction is cancelled, not awaited to completion

pub mod connection;
pub mod control;
pub mod listener;
pub mod session;
