//! Client configuration.
//!
//! Built once at startup and handed to the channel constructors. Nothing in
//! this crate reads endpoints or credentials from ambient state.

use std::{fmt, time::Duration};

use zeroize::Zeroize;

/// Request/response endpoint used when none is configured.
pub const DEFAULT_HTTP_ENDPOINT: &str = "http://localhost:8080/v1/graphql";

/// Streaming endpoint used when none is configured.
pub const DEFAULT_WS_ENDPOINT: &str = "ws://localhost:8080/v1/graphql";

/// Header carrying the static admin credential.
pub const ADMIN_SECRET_HEADER: &str = "x-hasura-admin-secret";

const DEFAULT_CONNECTION_ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Static admin credential shared by both channels.
#[derive(Clone)]
pub struct AdminSecret {
    value: String,
}

impl AdminSecret {
    /// Wrap a raw credential.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Raw credential, for attaching to outgoing requests.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminSecret(**redacted**)")
    }
}

impl Drop for AdminSecret {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// Reconnection policy for the streaming channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Reconnection attempts made after a failure before the feed gives up.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    /// Delay to wait before retry number `attempt` (1-based).
    ///
    /// Doubles from `initial_delay` and saturates at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));

        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `failures` consecutive failures.
    #[must_use]
    pub const fn allows(&self, failures: u32) -> bool {
        failures <= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Backend endpoints, credential and streaming behaviour.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request/response (HTTP) endpoint.
    pub http_endpoint: String,

    /// Streaming (WebSocket) endpoint.
    pub ws_endpoint: String,

    /// Credential attached to both channels.
    pub admin_secret: AdminSecret,

    /// Streaming reconnection policy.
    pub reconnect: ReconnectPolicy,

    /// How long the streaming channel waits for `connection_ack`.
    pub connection_ack_timeout: Duration,
}

impl ClientConfig {
    /// Configuration for the given endpoints with default streaming behaviour.
    #[must_use]
    pub fn new(
        http_endpoint: impl Into<String>,
        ws_endpoint: impl Into<String>,
        admin_secret: AdminSecret,
    ) -> Self {
        Self {
            http_endpoint: http_endpoint.into(),
            ws_endpoint: ws_endpoint.into(),
            admin_secret,
            reconnect: ReconnectPolicy::default(),
            connection_ack_timeout: DEFAULT_CONNECTION_ACK_TIMEOUT,
        }
    }

    /// Configuration pointing at a backend on `localhost:8080`.
    #[must_use]
    pub fn local(admin_secret: AdminSecret) -> Self {
        Self::new(DEFAULT_HTTP_ENDPOINT, DEFAULT_WS_ENDPOINT, admin_secret)
    }

    /// Replace the reconnection policy.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Replace the `connection_ack` timeout.
    #[must_use]
    pub fn with_connection_ack_timeout(mut self, timeout: Duration) -> Self {
        self.connection_ack_timeout = timeout;
        self
    }
}
