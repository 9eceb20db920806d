//! Transport Router

use std::{fmt, sync::Arc};

use futures::{StreamExt, future, stream};
use serde_json::Value;

use crate::{
    config::ClientConfig,
    transport::{
        channels::{RequestChannel, ResponseStream, StreamingChannel},
        errors::{FeedError, RequestError},
        http::HttpChannel,
        payload::{Operation, OperationKind},
        ws::WsChannel,
    },
};

/// The channel selected for an operation.
pub enum Route<'a> {
    /// Long-lived subscriptions.
    Streaming(&'a dyn StreamingChannel),

    /// One-shot queries and mutations.
    RequestResponse(&'a dyn RequestChannel),
}

/// Sends each operation down exactly one channel, chosen by its kind.
///
/// There is no failover: when the selected channel is unreachable the
/// operation fails.
#[derive(Clone)]
pub struct TransportRouter {
    request: Arc<dyn RequestChannel>,
    streaming: Arc<dyn StreamingChannel>,
}

impl TransportRouter {
    /// Router over explicit channels.
    #[must_use]
    pub fn new(request: Arc<dyn RequestChannel>, streaming: Arc<dyn StreamingChannel>) -> Self {
        Self { request, streaming }
    }

    /// Router over an [`HttpChannel`] and a [`WsChannel`] built from `config`.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            Arc::new(HttpChannel::new(config)),
            Arc::new(WsChannel::new(config.clone())),
        )
    }

    /// Subscriptions stream, everything else is a single request.
    #[must_use]
    pub fn route(&self, operation: &Operation) -> Route<'_> {
        match operation.kind {
            OperationKind::Subscription => Route::Streaming(self.streaming.as_ref()),
            OperationKind::Query | OperationKind::Mutation => {
                Route::RequestResponse(self.request.as_ref())
            }
        }
    }

    /// Execute a query or mutation.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Misrouted`] for subscriptions, otherwise
    /// whatever the request channel reports.
    pub async fn execute(&self, operation: Operation) -> Result<Value, RequestError> {
        match self.route(&operation) {
            Route::RequestResponse(channel) => channel.execute(operation).await,
            Route::Streaming(_) => Err(RequestError::Misrouted {
                operation: operation.name,
                kind: operation.kind,
            }),
        }
    }

    /// Start a subscription. Queries and mutations yield a single
    /// [`FeedError::Misrouted`].
    #[must_use]
    pub fn subscribe(&self, operation: Operation) -> ResponseStream {
        match self.route(&operation) {
            Route::Streaming(channel) => channel.subscribe(operation),
            Route::RequestResponse(_) => stream::once(future::ready(Err(FeedError::Misrouted {
                operation: operation.name,
                kind: operation.kind,
            })))
            .boxed(),
        }
    }
}

impl fmt::Debug for Route<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming(_) => f.write_str("Route::Streaming"),
            Self::RequestResponse(_) => f.write_str("Route::RequestResponse"),
        }
    }
}

impl fmt::Debug for TransportRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRouter").finish_non_exhaustive()
    }
}
