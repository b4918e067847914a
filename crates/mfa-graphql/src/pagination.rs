//! Sequential cursor walking, independent of the transport.

use std::collections::HashSet;
use std::future::Future;

use thiserror::Error;

use crate::error::GraphqlClientError;

/// Where a page sits in the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPageInfo {
    pub has_next_page: bool,
    /// Cursor to resume after this page; `None` on an empty page.
    pub end_cursor: Option<String>,
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub page_info: CursorPageInfo,
}

/// Why a walk stopped before the last page.
#[derive(Debug, Clone, Error)]
pub enum PaginationError {
    #[error("page request failed: {0}")]
    Client(#[from] GraphqlClientError),

    /// The server reported another page without a cursor to reach it.
    #[error("connection `{connection}` reported a next page without a cursor")]
    MissingCursor {
        /// Connection being walked.
        connection: String,
    },

    /// The server handed back a cursor that was already requested.
    #[error("connection `{connection}` repeated cursor `{cursor}`")]
    StalledCursor {
        /// Connection being walked.
        connection: String,
        /// Repeated cursor.
        cursor: String,
    },

    /// The page payload did not have the connection shape.
    #[error("connection `{connection}` returned a malformed page: {message}")]
    MalformedPage {
        /// Connection being walked.
        connection: String,
        /// Details.
        message: String,
    },
}

/// Walk pages until one reports `has_next_page == false`.
///
/// `fetch_page` is called with `initial_cursor` first and then with each
/// page's end cursor until a page reports no next page. Requests are strictly
/// sequential. The first error aborts the walk and nothing collected so far is
/// returned.
pub async fn paginate_cursor<T, F, Fut>(
    connection: &str,
    initial_cursor: Option<String>,
    mut fetch_page: F,
) -> Result<Vec<T>, PaginationError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<CursorPage<T>, PaginationError>>,
{
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = initial_cursor;
    if let Some(ref first) = cursor {
        seen.insert(first.clone());
    }

    loop {
        let page = fetch_page(cursor.take()).await?;
        out.extend(page.items);

        if !page.page_info.has_next_page {
            break;
        }
        let next = page
            .page_info
            .end_cursor
            .ok_or_else(|| PaginationError::MissingCursor {
                connection: connection.to_string(),
            })?;
        if !seen.insert(next.clone()) {
            return Err(PaginationError::StalledCursor {
                connection: connection.to_string(),
                cursor: next,
            });
        }
        cursor = Some(next);
    }

    Ok(out)
}
