//! Client failures, split by the layer that produced them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One entry of a response's `errors` member.
///
/// Only `message` is guaranteed; Shopify adds `extensions.code`
/// (`THROTTLED`, `ACCESS_DENIED`, ...) and the query cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    /// `extensions.code`, when the server sent one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

/// Failure of a single GraphQL round trip.
#[derive(Debug, Clone, Error)]
pub enum GraphqlClientError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("request failed: {message}")]
    Network { message: String, timed_out: bool },

    /// Non-2xx answer. `body` is cut to a few KiB.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not a GraphQL envelope.
    #[error("unreadable response: {0}")]
    Decode(String),

    /// The envelope carried an `errors` member.
    #[error("GraphQL errors: {}", render_errors(.errors))]
    Graphql { errors: Vec<GraphqlError> },

    /// The envelope had neither `errors` nor `data`, or `data` had the
    /// wrong shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GraphqlClientError {
    /// `true` when the failure happened below the GraphQL layer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Status { .. } | Self::Decode(_)
        )
    }

    /// HTTP status of the answer, if one arrived.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GraphqlClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for GraphqlClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

fn render_errors(errors: &[GraphqlError]) -> String {
    serde_json::to_string(errors).unwrap_or_else(|_| format!("{errors:?}"))
}
