//! GraphQL over HTTP POST.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::envelope::{GraphqlRequest, GraphqlResponse};
use crate::error::GraphqlClientError;

/// Longest error body kept in [`GraphqlClientError::Status`].
const MAX_ERROR_BODY: usize = 4096;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct Counters {
    sent: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Request counts since the client was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestStats {
    pub sent: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Builds a [`GraphqlClient`].
#[derive(Debug, Clone)]
pub struct GraphqlClientBuilder {
    endpoint: String,
    label: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl GraphqlClientBuilder {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            endpoint: endpoint.into(),
            label: "graphql".into(),
            headers,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Name recorded on the client's tracing spans.
    #[must_use]
    pub fn with_service_name(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Send `name: value` on every request.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Per-request timeout (default 30s).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GraphqlClient, GraphqlClientError> {
        let http = reqwest::Client::builder()
            .default_headers(self.headers)
            .timeout(self.timeout)
            .build()?;
        Ok(GraphqlClient {
            inner: Arc::new(Inner {
                endpoint: self.endpoint,
                label: self.label,
                http,
                counters: Counters::default(),
            }),
        })
    }
}

#[derive(Debug)]
struct Inner {
    endpoint: String,
    label: String,
    http: reqwest::Client,
    counters: Counters,
}

/// Posts raw documents to one endpoint.
///
/// Every call is exactly one HTTP request; nothing is retried. Clones share
/// the connection pool and the counters.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    inner: Arc<Inner>,
}

impl GraphqlClient {
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    #[must_use]
    pub fn stats(&self) -> RequestStats {
        let counters = &self.inner.counters;
        RequestStats {
            sent: counters.sent.load(Ordering::Relaxed),
            succeeded: counters.succeeded.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Run `document` with `variables` and return the `data` member.
    #[instrument(skip_all, fields(service = %self.inner.label))]
    pub async fn execute(&self, document: &str, variables: Value) -> Result<Value, GraphqlClientError> {
        let counters = &self.inner.counters;
        counters.sent.fetch_add(1, Ordering::Relaxed);

        let result = self.post(document, &variables).await;
        match &result {
            Ok(_) => counters.succeeded.fetch_add(1, Ordering::Relaxed),
            Err(err) => {
                warn!(error = %err, "GraphQL request failed");
                counters.failed.fetch_add(1, Ordering::Relaxed)
            }
        };
        result
    }

    async fn post(&self, document: &str, variables: &Value) -> Result<Value, GraphqlClientError> {
        let body = serde_json::to_vec(&GraphqlRequest {
            query: document,
            variables,
        })?;
        debug!(endpoint = %self.inner.endpoint, bytes = body.len(), "posting GraphQL request");

        let response = self
            .inner
            .http
            .post(&self.inner.endpoint)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(GraphqlClientError::Status {
                status: status.as_u16(),
                body: truncate_body(&bytes),
            });
        }

        serde_json::from_slice::<GraphqlResponse>(&bytes)?.into_data()
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    let mut body = String::from_utf8_lossy(bytes).into_owned();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|&i| body.is_char_boundary(i))
            .unwrap_or(0);
        body.truncate(cut);
        body.push('…');
    }
    body
}
