//! Audit error types.

use mfa_graphql::{GraphqlClientError, PaginationError};
use thiserror::Error;

/// Errors raised while auditing the catalog.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or HTTP-level failure talking to the Admin API.
    #[error("Shopify transport error: {0}")]
    Transport(GraphqlClientError),

    /// The Admin API answered with GraphQL errors.
    #[error("Shopify API error: {0}")]
    Api(GraphqlClientError),

    /// A connection could not be walked to the end.
    #[error("pagination error: {0}")]
    Pagination(PaginationError),

    /// The spreadsheet could not be written.
    #[error("report error: {0}")]
    Report(String),

    /// The report email could not be sent.
    #[error("notification error: {0}")]
    Notify(String),
}

impl AuditError {
    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Short machine-readable kind, used as a log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport(_) => "transport",
            Self::Api(_) => "api",
            Self::Pagination(_) => "pagination",
            Self::Report(_) => "report",
            Self::Notify(_) => "notify",
        }
    }
}

impl From<GraphqlClientError> for AuditError {
    fn from(err: GraphqlClientError) -> Self {
        if err.is_transport() {
            Self::Transport(err)
        } else {
            Self::Api(err)
        }
    }
}

impl From<PaginationError> for AuditError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::Client(inner) => inner.into(),
            other => Self::Pagination(other),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AuditError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Report(err.to_string())
    }
}

impl From<lettre::error::Error> for AuditError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Notify(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for AuditError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Notify(err.to_string())
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
