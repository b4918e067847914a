//! Wire shapes of a GraphQL POST.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{GraphqlClientError, GraphqlError};

/// Request body: `{"query": ..., "variables": ...}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GraphqlRequest<'a> {
    pub query: &'a str,
    pub variables: &'a Value,
}

/// Response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    /// Absent and `null` both mean no errors.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<GraphqlError>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<GraphqlError>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<GraphqlError>>::deserialize(deserializer)?.unwrap_or_default())
}

impl GraphqlResponse {
    /// The `data` member, or the failure the envelope describes.
    ///
    /// A non-empty `errors` member fails the call even when partial data
    /// came back alongside it.
    pub fn into_data(self) -> Result<Value, GraphqlClientError> {
        if !self.errors.is_empty() {
            return Err(GraphqlClientError::Graphql {
                errors: self.errors,
            });
        }
        match self.data {
            Some(Value::Null) | None => Err(GraphqlClientError::Malformed(
                "response has neither data nor errors".into(),
            )),
            Some(data) => Ok(data),
        }
    }
}
