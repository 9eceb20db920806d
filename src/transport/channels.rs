//! Channel seams.

use async_trait::async_trait;
use futures::stream::BoxStream;
use mockall::automock;
use serde_json::Value;

use crate::transport::{
    errors::{FeedError, RequestError},
    payload::Operation,
};

/// Stream of `data` values delivered by a subscription.
pub type ResponseStream = BoxStream<'static, Result<Value, FeedError>>;

/// One-shot request/response channel.
#[automock]
#[async_trait]
pub trait RequestChannel: Send + Sync {
    /// Execute the operation once, without retrying.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] when the operation cannot be delivered or
    /// the backend rejects it.
    async fn execute(&self, operation: Operation) -> Result<Value, RequestError>;
}

/// Persistent streaming channel.
#[automock]
pub trait StreamingChannel: Send + Sync {
    /// Start a subscription.
    ///
    /// The returned stream is lazy: nothing is sent until it is first
    /// polled. Dropping it tears the subscription down.
    fn subscribe(&self, operation: Operation) -> ResponseStream;
}
