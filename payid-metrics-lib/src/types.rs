//! Value types shared between the host and the metrics manager

use serde::{Deserialize, Serialize};

/// Count of addresses for one (payment network, environment) pair
///
/// Produced by the host's address count query on every refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCount {
    pub payment_network: String,
    pub environment: String,
    pub count: u64,
}

impl AddressCount {
    pub fn new<N, E>(payment_network: N, environment: E, count: u64) -> Self
    where
        N: Into<String>,
        E: Into<String>,
    {
        Self {
            payment_network: payment_network.into(),
            environment: environment.into(),
            count,
        }
    }
}

/// Outcome of a PayID lookup, used as the `result` label of the lookup counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupResult {
    Found,
    NotFound,
    /// The request was rejected before lookup because of its Accept header
    BadAcceptHeader,
}

impl LookupResult {
    pub fn as_label(&self) -> &'static str {
        match self {
            LookupResult::Found => "found",
            LookupResult::NotFound => "not_found",
            LookupResult::BadAcceptHeader => "error: bad_accept_header",
        }
    }
}

impl From<bool> for LookupResult {
    fn from(found: bool) -> Self {
        if found {
            LookupResult::Found
        } else {
            LookupResult::NotFound
        }
    }
}

impl std::fmt::Display for LookupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}
