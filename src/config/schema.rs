//! Routing-table schema definitions.
//!
//! Wire format (one JSON object per control connection):
//! `{"nodes": [{"addr": "<host:port>"}, ...], "responseNodeAddr": "<addr>"}`.
//! An empty `responseNodeAddr` means no response is relayed to the client.

use serde::{Deserialize, Serialize};

/// A destination address. Equality is address equality; an endpoint has no
/// identity beyond its address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoint {
    /// Destination address, host:port.
    pub addr: String,
}

/// The relay's unit of configuration: the destinations client traffic is
/// fanned out to, and which of them (if any) supplies the response stream.
///
/// `destinations` is `None` when the `nodes` field was absent on the wire.
/// Absent is *invalid*; empty-but-present is valid and means "drop
/// everything". The distinction is what `is_valid` gates on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoutingTable {
    /// Destination endpoints, in dialing order.
    #[serde(rename = "nodes")]
    pub destinations: Option<Vec<Endpoint>>,

    /// Address of the destination whose bytes flow back to the client.
    /// Empty means data flows one way only.
    #[serde(rename = "responseNodeAddr", default)]
    pub response_source: String,
}

impl RoutingTable {
    /// The table a freshly started relay runs with: no destinations, no
    /// response source. Valid, and closes every client connection cleanly.
    pub fn empty() -> Self {
        Self {
            destinations: Some(Vec::new()),
            response_source: String::new(),
        }
    }

    /// Pure validity predicate. False when `destinations` is absent, or when
    /// a non-empty `response_source` matches no destination address.
    pub fn is_valid(&self) -> bool {
        let Some(destinations) = &self.destinations else {
            return false;
        };
        if self.response_source.is_empty() {
            return true;
        }
        destinations.iter().any(|d| d.addr == self.response_source)
    }
}

impl std::fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nodes=[")?;
        for (i, endpoint) in self.destinations.iter().flatten().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", endpoint.addr)?;
        }
        write!(f, "] response={}", self.response_source)
    }
}
