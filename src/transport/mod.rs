//! GraphQL transport.
//!
//! Operations are routed by kind: subscriptions go to the streaming
//! (WebSocket) channel, queries and mutations to the request/response (HTTP)
//! channel.

mod channels;
mod errors;
pub mod http;
mod payload;
mod router;
pub mod ws;

pub use channels::*;
pub use errors::*;
pub use http::HttpChannel;
pub use payload::{GraphQlError, Operation, OperationKind};
pub use router::*;
pub use ws::WsChannel;
