//! `graphql-transport-ws` messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::{ADMIN_SECRET_HEADER, AdminSecret},
    transport::payload::{GraphQlError, GraphQlRequest, GraphQlResponse},
};

pub(crate) const SUBPROTOCOL: &str = "graphql-transport-ws";

/// Client to server messages.
///
/// No `Debug`: `connection_init` carries the admin secret.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ClientMessage<'a> {
    ConnectionInit { payload: InitPayload<'a> },
    Subscribe { id: &'a str, payload: GraphQlRequest<'a> },
    Pong {},
}

#[derive(Serialize)]
pub(crate) struct InitPayload<'a> {
    headers: BTreeMap<&'static str, &'a str>,
}

impl<'a> ClientMessage<'a> {
    /// `connection_init` carrying the credential as a connection header.
    pub fn connection_init(secret: &'a AdminSecret) -> Self {
        let mut headers = BTreeMap::new();

        headers.insert(ADMIN_SECRET_HEADER, secret.expose());

        Self::ConnectionInit {
            payload: InitPayload { headers },
        }
    }
}

/// Server to client messages.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ServerMessage {
    ConnectionAck {},
    Next { id: String, payload: GraphQlResponse },
    Error { id: String, payload: Vec<GraphQlError> },
    Complete { id: String },
    Ping {},
    Pong {},
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::transport::Operation;

    use super::*;

    #[test]
    fn connection_init_carries_admin_header() -> TestResult {
        let secret = AdminSecret::new("myadminsecretkey");

        assert_eq!(
            serde_json::to_value(ClientMessage::connection_init(&secret))?,
            json!({
                "type": "connection_init",
                "payload": { "headers": { "x-hasura-admin-secret": "myadminsecretkey" } }
            })
        );

        Ok(())
    }

    #[test]
    fn subscribe_wraps_the_request() -> TestResult {
        let operation = Operation::subscription("WatchProducts", "subscription WatchProducts { x }");

        let message = ClientMessage::Subscribe {
            id: "abc",
            payload: operation.to_request(),
        };

        assert_eq!(
            serde_json::to_value(message)?,
            json!({
                "type": "subscribe",
                "id": "abc",
                "payload": {
                    "query": "subscription WatchProducts { x }",
                    "operationName": "WatchProducts",
                    "variables": {}
                }
            })
        );

        Ok(())
    }

    #[test]
    fn pong_is_type_only() -> TestResult {
        assert_eq!(
            serde_json::to_value(ClientMessage::Pong {})?,
            json!({ "type": "pong" })
        );

        Ok(())
    }

    #[test]
    fn server_messages_decode_with_or_without_payload() -> TestResult {
        let ack: ServerMessage =
            serde_json::from_value(json!({ "type": "connection_ack", "payload": {} }))?;
        let ping: ServerMessage = serde_json::from_value(json!({ "type": "ping" }))?;
        let next: ServerMessage = serde_json::from_value(json!({
            "type": "next",
            "id": "abc",
            "payload": { "data": { "product": [] } }
        }))?;
        let error: ServerMessage = serde_json::from_value(json!({
            "type": "error",
            "id": "abc",
            "payload": [{ "message": "field 'product' not found" }]
        }))?;

        assert!(matches!(ack, ServerMessage::ConnectionAck {}));
        assert!(matches!(ping, ServerMessage::Ping {}));
        assert!(matches!(next, ServerMessage::Next { ref id, .. } if id == "abc"));
        assert!(matches!(error, ServerMessage::Error { ref payload, .. } if payload.len() == 1));

        Ok(())
    }
}
