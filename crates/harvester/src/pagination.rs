//! Cursor-paginated collection walks.
//!
//! One engine, parameterized over a query plus an item parser per entity
//! type. Termination relies on the upstream eventually answering
//! `hasNextPage: false`; the engine does not cap page count.

use anyhow::{anyhow, Result};
use records::parse::Parse;
use serde_json::Value;

use crate::client::GithubTransport;
use crate::progress::ProgressSink;
use crate::query::CollectionQuery;

/// One page of a cursor-paginated collection.
#[derive(Debug, Clone)]
pub struct Page {
    pub edges: Vec<Value>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    /// Meaningful only on the first page; sizes the progress indicator.
    pub total_count: Option<i64>,
}

impl Page {
    fn from_connection(connection: &Value, total_field: &str) -> Result<Self> {
        let page_info = connection
            .get("pageInfo")
            .ok_or_else(|| anyhow!("missing pageInfo in connection"))?;
        Ok(Self {
            edges: connection
                .get("edges")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            end_cursor: page_info
                .get("endCursor")
                .and_then(Value::as_str)
                .map(str::to_string),
            has_next_page: page_info
                .get("hasNextPage")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            total_count: connection.get(total_field).and_then(Value::as_i64),
        })
    }
}

/// Walk a dot-separated path into a JSON body. A null along the way (an
/// unknown repository or owner) reads as absent.
fn pluck<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for key in path.split('.') {
        current = current.get(key)?;
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Exhaustively walk one collection, feeding every edge to the parser and
/// advancing the progress sink once per edge, parsed or skipped. A
/// transport or API failure aborts the whole walk; no partial-page retry.
pub async fn paginate<T, P>(
    transport: &dyn GithubTransport,
    query: &CollectionQuery,
    parser: P,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<T>>
where
    P: Fn(&Value) -> Parse<T>,
{
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut first_page = true;

    loop {
        let rendered = query.render(cursor.as_deref());
        let body = transport.post_query(&rendered).await?;
        let connection = pluck(&body, query.connection())
            .ok_or_else(|| anyhow!("missing {} in GraphQL response", query.connection()))?;
        let page = Page::from_connection(connection, query.total_field())?;

        if first_page {
            let total = page.total_count.unwrap_or(0).max(0) as u64;
            progress.start(query.label(), total);
            first_page = false;
        }

        for edge in &page.edges {
            if let Parse::Row(record) = parser(edge) {
                records.push(record);
            }
            progress.step();
        }

        if !page.has_next_page {
            break;
        }
        cursor = Some(page.end_cursor.clone().ok_or_else(|| {
            anyhow!("{}: hasNextPage set without an endCursor", query.label())
        })?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pluck_walks_nested_keys() {
        let body = json!({ "data": { "repository": { "issues": { "totalCount": 3 } } } });
        let connection = pluck(&body, "data.repository.issues").unwrap();
        assert_eq!(connection["totalCount"], 3);
    }

    #[test]
    fn pluck_treats_null_as_absent() {
        let body = json!({ "data": { "repositoryOwner": null } });
        assert!(pluck(&body, "data.repositoryOwner.repositories").is_none());
    }

    #[test]
    fn page_reads_cursor_and_flag() {
        let connection = json!({
            "pageInfo": { "hasNextPage": true, "endCursor": "abc" },
            "totalCount": 42,
            "edges": [{}, {}]
        });
        let page = Page::from_connection(&connection, "totalCount").unwrap();
        assert!(page.has_next_page);
        assert_eq!(page.end_cursor.as_deref(), Some("abc"));
        assert_eq!(page.total_count, Some(42));
        assert_eq!(page.edges.len(), 2);
    }
}
