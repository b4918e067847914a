//! Per-type metafield checkers.

use mfa_graphql::{ConnectionQuery, GraphqlClient, fetch_connection};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::AuditResult;
use crate::metafields::AliasedMetafields;
use crate::types::{MissingRecord, ResourceType, Visibility};

/// Finds visible resources of one type that lack required metafields.
#[derive(Debug, Clone)]
pub struct ResourceChecker {
    resource_type: ResourceType,
    metafields: AliasedMetafields,
}

impl ResourceChecker {
    #[must_use]
    pub const fn new(resource_type: ResourceType, metafields: AliasedMetafields) -> Self {
        Self {
            resource_type,
            metafields,
        }
    }

    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    #[must_use]
    pub const fn metafields(&self) -> &AliasedMetafields {
        &self.metafields
    }

    /// Connection query for this type, or `None` when nothing is required.
    #[must_use]
    pub fn query(&self) -> Option<ConnectionQuery> {
        if self.metafields.is_empty() {
            return None;
        }

        let mut selection = String::from("id\nhandle\ntitle");
        if self.resource_type.visibility() == Visibility::PublishedAt {
            selection.push_str("\npublishedAt");
        }
        selection.push('\n');
        selection.push_str(&self.metafields.selection());

        let mut query = ConnectionQuery::new(self.resource_type.connection(), selection);
        if let Some(sort_key) = self.resource_type.sort_key() {
            query = query.with_sort_key(sort_key);
        }
        if let Visibility::ServerFilter(filter) = self.resource_type.visibility() {
            query = query.with_filter_query(filter);
        }
        Some(query)
    }

    /// Walk the connection and collect records for incomplete visible nodes.
    #[instrument(skip_all, fields(resource_type = %self.resource_type))]
    pub async fn check(&self, client: &GraphqlClient) -> AuditResult<Vec<MissingRecord>> {
        let Some(query) = self.query() else {
            debug!("no required metafields, skipping");
            return Ok(Vec::new());
        };

        let nodes = fetch_connection(client, &query).await?;
        let scanned = nodes.len();
        let records: Vec<_> = nodes
            .iter()
            .filter_map(|node| self.evaluate(node))
            .collect();

        info!(scanned, missing = records.len(), "checked resources");
        Ok(records)
    }

    /// Record for `node` if it is visible and incomplete.
    #[must_use]
    pub fn evaluate(&self, node: &Value) -> Option<MissingRecord> {
        if self.resource_type.visibility() == Visibility::PublishedAt
            && node.get("publishedAt").is_none_or(Value::is_null)
        {
            return None;
        }

        let missing = self.metafields.missing(node);
        if missing.is_empty() {
            return None;
        }

        Some(MissingRecord {
            resource_type: self.resource_type,
            status: self.resource_type.status().to_string(),
            id: string_field(node, "id"),
            handle: string_field(node, "handle"),
            title: string_field(node, "title"),
            missing,
        })
    }
}

fn string_field(node: &Value, field: &str) -> String {
    node.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
