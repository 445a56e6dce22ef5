//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; every connection runs inside a span
//!   carrying its id and peer address
//! - Log level configurable via `RUST_LOG`

pub mod logging;
