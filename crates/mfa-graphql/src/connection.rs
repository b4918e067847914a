//! Relay-style connection walking.
//!
//! A [`ConnectionQuery`] renders the document for one root connection and the
//! variables for one page; [`fetch_connection`] drives it through
//! [`paginate_cursor`] until the server reports no next page.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::client::GraphqlClient;
use crate::pagination::{CursorPage, CursorPageInfo, PaginationError, paginate_cursor};

/// Nodes requested per page.
pub const PAGE_SIZE: u32 = 200;

/// Query over a single root connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionQuery {
    connection: String,
    selection: String,
    sort_key: Option<String>,
    filter_query: Option<String>,
}

impl ConnectionQuery {
    /// Query `connection`, selecting `selection` on every node.
    #[must_use]
    pub fn new(connection: impl Into<String>, selection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            selection: selection.into(),
            sort_key: None,
            filter_query: None,
        }
    }

    /// Pin the ordering with a sort key enum value (e.g. `ID`).
    #[must_use]
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Filter server-side with a search query string.
    #[must_use]
    pub fn with_filter_query(mut self, filter_query: impl Into<String>) -> Self {
        self.filter_query = Some(filter_query.into());
        self
    }

    /// Root connection name.
    #[must_use]
    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// Render the query document.
    ///
    /// `$query` is declared only when a filter is set: GraphQL rejects
    /// documents declaring variables they never use.
    #[must_use]
    pub fn document(&self) -> String {
        let has_query = self.filter_query.is_some();
        let header = if has_query {
            "query($cursor: String, $query: String)"
        } else {
            "query($cursor: String)"
        };

        let mut args = vec![format!("first: {PAGE_SIZE}"), "after: $cursor".to_string()];
        if let Some(sort_key) = &self.sort_key {
            args.push(format!("sortKey: {sort_key}"));
        }
        if has_query {
            args.push("query: $query".to_string());
        }

        format!(
            "{header} {{\n  {connection}({args}) {{\n    edges {{ cursor node {{ {selection} }} }}\n    pageInfo {{ hasNextPage }}\n  }}\n}}",
            connection = self.connection,
            args = args.join(", "),
            selection = self.selection.trim(),
        )
    }

    /// Variables for the page starting after `cursor`.
    #[must_use]
    pub fn variables(&self, cursor: Option<&str>) -> Value {
        let mut vars = Map::new();
        vars.insert(
            "cursor".to_string(),
            cursor.map_or(Value::Null, |c| Value::String(c.to_string())),
        );
        if let Some(filter_query) = &self.filter_query {
            vars.insert("query".to_string(), Value::String(filter_query.clone()));
        }
        Value::Object(vars)
    }

    /// Pull edges and page info out of a response `data` member.
    pub fn parse_page(&self, data: &Value) -> Result<CursorPage<Value>, PaginationError> {
        let malformed = |message: &str| PaginationError::MalformedPage {
            connection: self.connection.clone(),
            message: message.to_string(),
        };

        let conn = data
            .get(&self.connection)
            .filter(|v| v.is_object())
            .ok_or_else(|| malformed("connection missing from data"))?;
        let edges = conn
            .get("edges")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("edges missing"))?;
        let has_next_page = conn
            .pointer("/pageInfo/hasNextPage")
            .and_then(Value::as_bool)
            .ok_or_else(|| malformed("pageInfo.hasNextPage missing"))?;

        let mut items = Vec::with_capacity(edges.len());
        let mut end_cursor = None;
        for edge in edges {
            let node = edge.get("node").ok_or_else(|| malformed("edge without node"))?;
            items.push(node.clone());
            end_cursor = edge
                .get("cursor")
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        Ok(CursorPage {
            items,
            page_info: CursorPageInfo {
                has_next_page,
                end_cursor,
            },
        })
    }
}

/// Fetch every node of a connection, in edge order across pages.
#[instrument(skip_all, fields(connection = %query.connection()))]
pub async fn fetch_connection(
    client: &GraphqlClient,
    query: &ConnectionQuery,
) -> Result<Vec<Value>, PaginationError> {
    let document = query.document();
    let nodes = paginate_cursor(query.connection(), None, |cursor| {
        let variables = query.variables(cursor.as_deref());
        let document = &document;
        async move {
            let data = client.execute(document, variables).await?;
            let page = query.parse_page(&data)?;
            debug!(
                nodes = page.items.len(),
                has_next_page = page.page_info.has_next_page,
                "fetched page"
            );
            Ok(page)
        }
    })
    .await?;

    debug!(total = nodes.len(), "connection exhausted");
    Ok(nodes)
}
