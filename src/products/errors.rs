//! Products service errors.

use thiserror::Error;

use crate::{
    products::models::ProductId,
    transport::{FailureKind, RequestError},
};

/// Failures of a create, update or delete.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The product no longer exists.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// The mutation returned no row.
    #[error("server returned no result for {0}")]
    MissingResult(&'static str),

    /// The request itself failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The response data had an unexpected shape.
    #[error("unexpected mutation payload")]
    Decode(#[source] serde_json::Error),
}

impl MutationError {
    /// Whether the failure happened in transit or was reported by the server.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Request(error) => error.kind(),
            Self::NotFound(_) | Self::MissingResult(_) | Self::Decode(_) => FailureKind::Server,
        }
    }
}

impl From<serde_json::Error> for MutationError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error)
    }
}
