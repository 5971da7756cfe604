//! The single failure kind of the remote gateway.

use std::fmt;

use thiserror::Error;

use crate::gateway::Collection;

/// Which gateway call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    FetchByOwner,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::FetchAll => "fetch",
            Operation::FetchByOwner => "fetch by owner",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Any transport, status or decode error from a gateway call.
///
/// Callers do not branch on the cause: a 404, a timeout and a malformed body
/// all surface as the same kind, carrying only enough context to log.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{operation} {collection}{suffix} failed: {message}", suffix = record_suffix(.id))]
pub struct GatewayFailure {
    pub operation: Operation,
    pub collection: Collection,
    pub id: Option<u64>,
    pub message: String,
}

fn record_suffix(id: &Option<u64>) -> String {
    id.map(|id| format!("/{id}")).unwrap_or_default()
}

impl GatewayFailure {
    pub fn new(
        operation: Operation,
        collection: Collection,
        id: Option<u64>,
        message: impl fmt::Display,
    ) -> Self {
        Self {
            operation,
            collection,
            id,
            message: message.to_string(),
        }
    }
}
