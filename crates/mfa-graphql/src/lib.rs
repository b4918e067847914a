//! MFA GraphQL - GraphQL client plumbing for catalog audits.
//!
//! This crate provides:
//! - A raw-document GraphQL HTTP client with transport/API error mapping.
//! - A generic cursor pagination driver.
//! - Relay-style connection queries walked page by page.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

mod client;
mod connection;
mod envelope;
mod error;
mod pagination;

pub use client::{GraphqlClient, GraphqlClientBuilder, RequestStats};
pub use connection::{ConnectionQuery, PAGE_SIZE, fetch_connection};
pub use envelope::{GraphqlRequest, GraphqlResponse};
pub use error::{GraphqlClientError, GraphqlError};
pub use pagination::{CursorPage, CursorPageInfo, PaginationError, paginate_cursor};
