//! MFA Shopify - metafield audit for a Shopify catalog.
//!
//! Walks the Admin API's products, collections and pages connections, finds
//! visible resources lacking required metafields, writes an `.xlsx` report
//! and emails it. Scans run on demand over HTTP or on a weekly schedule.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod checker;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod metafields;
pub mod notify;
pub mod report;
pub mod scan;
pub mod scheduler;
pub mod server;
pub mod types;

pub use config::AuditConfig;
pub use error::{AuditError, AuditResult};
pub use scan::Scanner;
pub use types::{MissingRecord, ResourceType, ScanResult};
