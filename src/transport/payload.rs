//! GraphQL operation and wire payloads.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operation kinds, as written in the document's leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// One-shot read.
    Query,

    /// One-shot write.
    Mutation,

    /// Long-lived stream of results.
    Subscription,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        })
    }
}

/// Outgoing operation descriptor.
///
/// The kind is fixed when the operation is built and decides, once, which
/// channel carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Which channel the operation belongs to.
    pub kind: OperationKind,

    /// `operationName` sent alongside the document.
    pub name: &'static str,

    /// GraphQL document text.
    pub document: &'static str,

    /// Variables object.
    pub variables: Value,
}

impl Operation {
    /// Build an operation with an empty variables object.
    #[must_use]
    pub fn new(kind: OperationKind, name: &'static str, document: &'static str) -> Self {
        Self {
            kind,
            name,
            document,
            variables: Value::Object(Map::new()),
        }
    }

    /// Request/response read.
    #[must_use]
    pub fn query(name: &'static str, document: &'static str) -> Self {
        Self::new(OperationKind::Query, name, document)
    }

    /// Request/response write.
    #[must_use]
    pub fn mutation(name: &'static str, document: &'static str) -> Self {
        Self::new(OperationKind::Mutation, name, document)
    }

    /// Long-lived push operation.
    #[must_use]
    pub fn subscription(name: &'static str, document: &'static str) -> Self {
        Self::new(OperationKind::Subscription, name, document)
    }

    /// Replace the variables object.
    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    pub(crate) fn to_request(&self) -> GraphQlRequest<'_> {
        GraphQlRequest {
            query: self.document,
            operation_name: self.name,
            variables: &self.variables,
        }
    }
}

/// Request body shared by the HTTP POST and the `subscribe` message.
#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a> {
    pub query: &'a str,

    #[serde(rename = "operationName")]
    pub operation_name: &'a str,

    pub variables: &'a Value,
}

/// Execution result, as returned over either channel.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// Split into the `data` value or the reported errors.
    ///
    /// Any reported error fails the whole result, even alongside partial
    /// data. A `null` data member counts as absent.
    pub fn into_result(self) -> Result<Option<Value>, Vec<GraphQlError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        Ok(self.data.filter(|data| !data.is_null()))
    }
}

/// Error reported by the backend for an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Human readable message.
    pub message: String,

    /// Backend specific details, such as Hasura's `code` and `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    /// Error with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: None,
        }
    }
}

impl Display for GraphQlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.message)
    }
}
