//! WebSocket streaming channel.
//!
//! Each subscription owns its own connection. The connection is opened on
//! first poll, re-opened after transport failures according to the
//! configured [`ReconnectPolicy`](crate::config::ReconnectPolicy), and
//! closed when the stream is dropped.

mod protocol;

use std::sync::Arc;

use futures::{SinkExt, StreamExt, stream};
use serde_json::Value;
use tokio::{net::TcpStream, time};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::SEC_WEBSOCKET_PROTOCOL},
    },
};
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    transport::{
        channels::{ResponseStream, StreamingChannel},
        errors::{FeedError, StreamError},
        payload::Operation,
    },
};

use protocol::{ClientMessage, SUBPROTOCOL, ServerMessage};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streams subscription results over `graphql-transport-ws`.
#[derive(Debug, Clone)]
pub struct WsChannel {
    config: Arc<ClientConfig>,
}

impl WsChannel {
    /// Create a new channel. Connections are opened per subscription.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl StreamingChannel for WsChannel {
    fn subscribe(&self, operation: Operation) -> ResponseStream {
        let worker = FeedWorker::new(Arc::clone(&self.config), operation);

        stream::unfold(worker, |mut worker| async move {
            let item = worker.next_item().await?;

            Some((item, worker))
        })
        .boxed()
    }
}

enum Step {
    Deliver(Value),
    Continue,
    Disconnected(StreamError),
    Terminal(FeedError),
}

struct FeedWorker {
    config: Arc<ClientConfig>,
    operation: Operation,
    subscription_id: String,
    socket: Option<Socket>,
    failures: u32,
    last_error: Option<StreamError>,
    finished: bool,
}

impl FeedWorker {
    fn new(config: Arc<ClientConfig>, operation: Operation) -> Self {
        Self {
            config,
            operation,
            subscription_id: Uuid::new_v4().to_string(),
            socket: None,
            failures: 0,
            last_error: None,
            finished: false,
        }
    }

    async fn next_item(&mut self) -> Option<Result<Value, FeedError>> {
        if self.finished {
            return None;
        }

        loop {
            if self.socket.is_none() {
                if let Err(error) = self.reconnect().await {
                    self.finished = true;

                    tracing::error!(operation = self.operation.name, %error, "live feed gave up");

                    return Some(Err(error));
                }
            }

            let frame = match self.socket.as_mut() {
                Some(socket) => socket.next().await,
                None => continue,
            };

            match self.handle_frame(frame).await {
                Step::Deliver(data) => {
                    self.failures = 0;
                    self.last_error = None;

                    return Some(Ok(data));
                }
                Step::Continue => {}
                Step::Disconnected(error) => {
                    self.socket = None;
                    self.failures = self.failures.saturating_add(1);

                    tracing::warn!(
                        operation = self.operation.name,
                        attempt = self.failures,
                        %error,
                        "live feed disconnected"
                    );

                    self.last_error = Some(error);
                }
                Step::Terminal(error) => {
                    self.socket = None;
                    self.finished = true;

                    tracing::error!(operation = self.operation.name, %error, "live feed ended");

                    return Some(Err(error));
                }
            }
        }
    }

    /// Open a connection, backing off between failed attempts.
    async fn reconnect(&mut self) -> Result<(), FeedError> {
        let policy = self.config.reconnect;

        loop {
            if self.failures > 0 {
                if !policy.allows(self.failures) {
                    return Err(FeedError::Exhausted {
                        attempts: self.failures.saturating_sub(1),
                        source: self.last_error.take().unwrap_or(StreamError::Closed),
                    });
                }

                let delay = policy.delay_for(self.failures);

                tracing::debug!(attempt = self.failures, ?delay, "reconnecting live feed");

                time::sleep(delay).await;
            }

            match self.open().await {
                Ok(socket) => {
                    self.socket = Some(socket);

                    return Ok(());
                }
                Err(error) => {
                    self.failures = self.failures.saturating_add(1);

                    tracing::warn!(
                        operation = self.operation.name,
                        attempt = self.failures,
                        %error,
                        "live feed connection failed"
                    );

                    self.last_error = Some(error);
                }
            }
        }
    }

    #[tracing::instrument(
        name = "transport.ws.open",
        skip(self),
        fields(operation = self.operation.name, subscription_id = %self.subscription_id),
        err
    )]
    async fn open(&self) -> Result<Socket, StreamError> {
        let mut request = self.config.ws_endpoint.as_str().into_client_request()?;

        request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));

        let (mut socket, _response) = connect_async(request).await?;

        send(
            &mut socket,
            &ClientMessage::connection_init(&self.config.admin_secret),
        )
        .await?;

        let ack_timeout = self.config.connection_ack_timeout;

        match time::timeout(ack_timeout, wait_for_ack(&mut socket)).await {
            Ok(acked) => acked?,
            Err(_elapsed) => return Err(StreamError::AckTimeout(ack_timeout)),
        }

        send(
            &mut socket,
            &ClientMessage::Subscribe {
                id: &self.subscription_id,
                payload: self.operation.to_request(),
            },
        )
        .await?;

        tracing::debug!("live feed subscribed");

        Ok(socket)
    }

    async fn handle_frame(&mut self, frame: Option<Result<Message, tungstenite::Error>>) -> Step {
        match frame {
            None | Some(Ok(Message::Close(_))) => Step::Disconnected(StreamError::Closed),
            Some(Err(error)) => Step::Disconnected(error.into()),
            Some(Ok(Message::Text(text))) => self.handle_message(text.as_str()).await,
            Some(Ok(_)) => Step::Continue,
        }
    }

    async fn handle_message(&mut self, text: &str) -> Step {
        let message = match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => message,
            Err(error) => return Step::Disconnected(error.into()),
        };

        match message {
            ServerMessage::Next { id, payload } if id == self.subscription_id => {
                match payload.into_result() {
                    Ok(Some(data)) => Step::Deliver(data),
                    Ok(None) => {
                        tracing::debug!("ignoring next message without data");

                        Step::Continue
                    }
                    Err(errors) => Step::Terminal(FeedError::Rejected {
                        operation: self.operation.name,
                        errors,
                    }),
                }
            }
            ServerMessage::Error { id, payload } if id == self.subscription_id => {
                Step::Terminal(FeedError::Rejected {
                    operation: self.operation.name,
                    errors: payload,
                })
            }
            ServerMessage::Complete { id } if id == self.subscription_id => {
                Step::Terminal(FeedError::Completed(self.operation.name))
            }
            ServerMessage::Ping {} => {
                let Some(socket) = self.socket.as_mut() else {
                    return Step::Disconnected(StreamError::Closed);
                };

                match send(socket, &ClientMessage::Pong {}).await {
                    Ok(()) => Step::Continue,
                    Err(error) => Step::Disconnected(error),
                }
            }
            ServerMessage::ConnectionAck {} | ServerMessage::Pong {} => Step::Continue,
            ServerMessage::Next { id, .. }
            | ServerMessage::Error { id, .. }
            | ServerMessage::Complete { id } => {
                tracing::debug!(%id, "ignoring message for another subscription");

                Step::Continue
            }
        }
    }
}

async fn wait_for_ack(socket: &mut Socket) -> Result<(), StreamError> {
    while let Some(frame) = socket.next().await {
        match frame? {
            Message::Text(text) => match serde_json::from_str::<ServerMessage>(text.as_str())? {
                ServerMessage::ConnectionAck {} => return Ok(()),
                ServerMessage::Ping {} => send(socket, &ClientMessage::Pong {}).await?,
                other => return Err(StreamError::Unexpected(format!("{other:?}"))),
            },
            Message::Close(_) => return Err(StreamError::Closed),
            _ => {}
        }
    }

    Err(StreamError::Closed)
}

async fn send(socket: &mut Socket, message: &ClientMessage<'_>) -> Result<(), StreamError> {
    let text = serde_json::to_string(message)?;

    socket.send(Message::text(text)).await?;

    Ok(())
}
