//! Backend Config

use std::time::Duration;

use clap::Args;

use livetable::config::{
    AdminSecret, ClientConfig, DEFAULT_HTTP_ENDPOINT, DEFAULT_WS_ENDPOINT, ReconnectPolicy,
};

/// GraphQL backend settings.
#[derive(Debug, Args)]
pub struct BackendConfig {
    /// GraphQL HTTP endpoint for queries and mutations
    #[arg(long, env = "LIVETABLE_HTTP_ENDPOINT", default_value = DEFAULT_HTTP_ENDPOINT)]
    pub http_endpoint: String,

    /// GraphQL WebSocket endpoint for subscriptions
    #[arg(long, env = "LIVETABLE_WS_ENDPOINT", default_value = DEFAULT_WS_ENDPOINT)]
    pub ws_endpoint: String,

    /// Admin secret sent with every operation
    #[arg(long, env = "LIVETABLE_ADMIN_SECRET", hide_env_values = true)]
    pub admin_secret: String,

    /// Reconnection attempts before live updates are reported unavailable
    #[arg(long, env = "LIVETABLE_RECONNECT_ATTEMPTS", default_value_t = 5_u32)]
    pub reconnect_attempts: u32,

    /// Seconds to wait for the subscription server to acknowledge a connection
    #[arg(long, env = "LIVETABLE_ACK_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub ack_timeout_seconds: u64,
}

impl BackendConfig {
    /// Library configuration for these settings.
    #[must_use]
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig::new(
            self.http_endpoint.clone(),
            self.ws_endpoint.clone(),
            AdminSecret::new(self.admin_secret.clone()),
        )
        .with_reconnect(ReconnectPolicy {
            max_attempts: self.reconnect_attempts,
            ..ReconnectPolicy::default()
        })
        .with_connection_ack_timeout(Duration::from_secs(self.ack_timeout_seconds))
    }
}
