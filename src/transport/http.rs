//! HTTP request/response channel.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{
    config::{ADMIN_SECRET_HEADER, AdminSecret, ClientConfig},
    transport::{
        channels::RequestChannel,
        errors::RequestError,
        payload::{GraphQlResponse, Operation},
    },
};

/// Posts operations to the GraphQL HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpChannel {
    endpoint: String,
    admin_secret: AdminSecret,
    http: Client,
}

impl HttpChannel {
    /// Create a new channel from the given configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            endpoint: config.http_endpoint.clone(),
            admin_secret: config.admin_secret.clone(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl RequestChannel for HttpChannel {
    #[tracing::instrument(
        name = "transport.http",
        skip(self, operation),
        fields(operation = operation.name),
        err
    )]
    async fn execute(&self, operation: Operation) -> Result<Value, RequestError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(ADMIN_SECRET_HEADER, self.admin_secret.expose())
            .json(&operation.to_request())
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GraphQlResponse = response.json().await?;

        match payload.into_result() {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(RequestError::MissingData(operation.name)),
            Err(errors) => Err(RequestError::Rejected {
                operation: operation.name,
                errors,
            }),
        }
    }
}
