//! Error types for the synchronization core.
//!
//! The failure taxonomy follows what the poll loop and edit dispatcher
//! need to distinguish:
//!
//! - network failures ([`Error::NotReachable`], [`Error::Request`],
//!   [`Error::Api`]) and parse failures ([`Error::Payload`]) are swallowed
//!   by the poll loop (logged, next tick continues) and resolve an edit
//!   write as failed;
//! - validation failures ([`Error::Validation`]) reject an edit before the
//!   store is touched;
//! - [`Error::Closed`] marks an operation against a panel that has already
//!   been shut down.

use thiserror::Error;

pub use crate::schema::ValidationError;

/// Errors from polling, edit writes, and client construction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The backend is not reachable.
    #[error("backend not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed after the connection was established.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error: {message}")]
    Api { status: u16, message: String },

    /// The response body was not the JSON we expect.
    #[error("malformed response from {url}: {source}")]
    Payload {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid base URL.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// Injected transport failure (mock backend).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Edit rejected before reaching the store or the network.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The owning panel has been shut down.
    #[error("panel is shut down")]
    Closed,
}

impl Error {
    /// True for failures of the network/parse kind that a poll loop
    /// swallows and an edit write reports as unsynced.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::NotReachable { .. }
                | Error::Request(_)
                | Error::Api { .. }
                | Error::Payload { .. }
                | Error::Unavailable(_)
        )
    }
}

/// Result type alias using the core's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
