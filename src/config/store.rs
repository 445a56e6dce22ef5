//! Thread-safe store for the current routing table.
//!
//! # Responsibilities
//! - Own the one table shared across all sessions
//! - Serialize readers and writers with a mutex
//! - Reject invalid tables without touching the stored one
//!
//! # Design Decisions
//! - Critical sections are copy-in/copy-out only, never I/O
//! - `get` returns a clone; a session's snapshot cannot be mutated by a
//!   later update

use std::sync::Mutex;
use thiserror::Error;

use crate::config::schema::RoutingTable;

/// Errors from a routing-table update.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Payload is not well-formed JSON for the wire format.
    #[error("malformed routing table: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed table violating the routing-table invariants.
    #[error("invalid routing table: destinations missing, or response source not among them")]
    Invalid,
}

/// Holds the current [`RoutingTable`] for the process lifetime.
///
/// Created once at startup with the empty table, replaced wholesale on every
/// successful control update, and read once per accepted client connection.
#[derive(Debug)]
pub struct ConfigStore {
    current: Mutex<RoutingTable>,
}

impl ConfigStore {
    /// Create a store holding the empty table (no destinations, no response
    /// source). Every value the store ever returns is valid.
    pub fn new() -> Self {
        Self {
            current: Mutex::new(RoutingTable::empty()),
        }
    }

    /// Snapshot the current table.
    pub fn get(&self) -> RoutingTable {
        self.current.lock().expect("routing table lock poisoned").clone()
    }

    /// Install a new table. Invalid tables are rejected and the stored table
    /// is left untouched.
    pub fn set(&self, table: RoutingTable) -> Result<(), ConfigError> {
        if !table.is_valid() {
            return Err(ConfigError::Invalid);
        }
        let mut current = self.current.lock().expect("routing table lock poisoned");
        *current = table;
        Ok(())
    }

    /// Deserialize a control payload and install it. Returns the installed
    /// table so callers can log what took effect.
    pub fn parse_and_set(&self, payload: &[u8]) -> Result<RoutingTable, ConfigError> {
        let table: RoutingTable = serde_json::from_slice(payload)?;
        self.set(table.clone())?;
        Ok(table)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
