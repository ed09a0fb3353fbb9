//! Failure taxonomy shared by every backend collaborator.
//!
//! Only [`FetchError::Permanent`] is allowed to stop a watch. Everything else is
//! absorbed by the refresh loop and shows up as one missed tick.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Cooperative cancellation observed at a suspension point. Never shown to the user.
    #[error("cancelled")]
    Cancelled,
    /// Network hiccup, timeout, throttling. Retried on the next poll tick.
    #[error("{0}")]
    Transient(String),
    /// Payload could not be decoded. Treated like a transient failure.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The resource is gone (or we are not allowed to see it). Stops the watch.
    #[error("{0}")]
    Permanent(String),
}

impl FetchError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
