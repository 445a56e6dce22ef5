//! Routing-table configuration subsystem.
//!
//! # Data Flow
//! ```text
//! control payload (JSON bytes)
//!     → store.rs parse_and_set (serde_json)
//!     → schema.rs is_valid (semantic check)
//!     → stored as the current RoutingTable
//!
//! On client accept:
//!     store.rs get
//!     → copy of the current table
//!     → fixed for the whole session
//! ```
//!
//! # Design Decisions
//! - Tables are immutable once constructed; an update always installs a
//!   brand-new table, never mutates the one in use
//! - The store hands out copies on both read and write, so no caller can
//!   alias its internal state
//! - Validation is a pure predicate and the single gate in front of the store

pub mod schema;
pub mod store;

pub use schema::{Endpoint, RoutingTable};
pub use store::{ConfigError, ConfigStore};
