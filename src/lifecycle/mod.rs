//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse args → Bind listeners → Start accept loops
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Accept loops stop → Sessions cancel → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Bind failures are the only process-fatal errors
//! - Every forwarding task subscribes to the shutdown broadcast, so no
//!   session outlives the drain deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
