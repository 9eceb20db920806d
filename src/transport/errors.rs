//! Transport errors.

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::transport::payload::{GraphQlError, OperationKind};

/// Where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The operation never got a usable answer: connect, send or receive failed.
    Transport,

    /// The backend answered and refused the operation.
    Server,
}

/// Request/response channel errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Connect, send or receive failed, or the body did not decode.
    #[error("request failed in transit")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend responded with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response carried GraphQL errors.
    #[error("{operation} rejected: {}", join_messages(errors))]
    Rejected {
        /// Operation name.
        operation: &'static str,
        /// Errors from the response's `errors` array.
        errors: Vec<GraphQlError>,
    },

    /// The response had neither data nor errors.
    #[error("{0} response carried no data")]
    MissingData(&'static str),

    /// A subscription was sent to the request channel.
    #[error("{operation} is a {kind} and cannot be executed as a single request")]
    Misrouted {
        /// Operation name.
        operation: &'static str,
        /// Kind the operation was declared as.
        kind: OperationKind,
    },
}

impl RequestError {
    /// Classify the failure.
    ///
    /// An undecodable response body means the backend did answer, so it
    /// counts as a server failure. A misrouted operation never left the
    /// client.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(error) if error.is_decode() => FailureKind::Server,
            Self::Transport(_) | Self::Misrouted { .. } => FailureKind::Transport,
            Self::Status { .. } | Self::Rejected { .. } | Self::MissingData(_) => {
                FailureKind::Server
            }
        }
    }
}

/// Terminal live feed errors. The feed yields at most one and then ends,
/// so a malformed snapshot stops live updates the same way exhaustion does.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Reconnection attempts ran out.
    #[error("live updates unavailable after {attempts} reconnection attempts")]
    Exhausted {
        /// Reconnection attempts made before giving up.
        attempts: u32,
        /// Failure of the last attempt.
        #[source]
        source: StreamError,
    },

    /// The backend refused the subscription.
    #[error("subscription {operation} rejected: {}", join_messages(errors))]
    Rejected {
        /// Operation name.
        operation: &'static str,
        /// Errors from the `error` message payload.
        errors: Vec<GraphQlError>,
    },

    /// The backend ended the subscription.
    #[error("subscription {0} was completed by the backend")]
    Completed(&'static str),

    /// A snapshot did not have the expected shape.
    #[error("unexpected snapshot payload")]
    Decode(#[source] serde_json::Error),

    /// A query or mutation was sent to the streaming channel.
    #[error("{operation} is a {kind} and cannot be streamed")]
    Misrouted {
        /// Operation name.
        operation: &'static str,
        /// Kind the operation was declared as.
        kind: OperationKind,
    },
}

impl FeedError {
    /// Classify the failure.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Exhausted { .. } | Self::Misrouted { .. } => FailureKind::Transport,
            Self::Rejected { .. } | Self::Completed(_) | Self::Decode(_) => FailureKind::Server,
        }
    }
}

/// Connection level failures on the streaming channel. These are retried
/// and only surface as the source of [`FeedError::Exhausted`].
#[derive(Debug, Error)]
pub enum StreamError {
    /// Handshake or socket failure.
    #[error("websocket failure")]
    WebSocket(#[source] Box<tungstenite::Error>),

    /// The server did not acknowledge `connection_init` in time.
    #[error("no connection_ack within {0:?}")]
    AckTimeout(Duration),

    /// The server closed the socket.
    #[error("connection closed")]
    Closed,

    /// A text frame was not a protocol message.
    #[error("malformed protocol message")]
    Protocol(#[from] serde_json::Error),

    /// A protocol message arrived out of order.
    #[error("unexpected protocol message: {0}")]
    Unexpected(String),
}

impl From<tungstenite::Error> for StreamError {
    fn from(error: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(error))
    }
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
