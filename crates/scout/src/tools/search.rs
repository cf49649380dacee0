//! Grep-like search over object keys and text content.

use super::ToolOptions;
use super::report::SearchMatch;
use crate::store::{ObjectEntry, ObjectStore, StoreError};
use crate::text::{FileKind, classify, contains_folded, decode, extract_snippet};

/// Scan every object under `prefix` and collect the first `limit` that match.
///
/// An object matches when `query` occurs in its key, or when it is a text
/// file under the content size ceiling and `query` occurs in its decoded
/// content. Both comparisons ignore case. Results keep scan order, and no
/// further pages are fetched once `limit` results are collected.
///
/// Failing to fetch one object's content only drops its content match.
/// Errors from the listing itself end the search.
pub async fn scan<F>(
    store: &dyn ObjectStore,
    query: &str,
    prefix: &str,
    limit: usize,
    options: &ToolOptions,
    display: F,
) -> Result<Vec<SearchMatch>, StoreError>
where
    F: Fn(&str) -> String,
{
    let mut results = Vec::new();
    if limit == 0 {
        return Ok(results);
    }

    let mut token = None;
    loop {
        let page = store.list_page(prefix, token).await?;

        for obj in page.objects {
            let name_match = contains_folded(&obj.key, query);
            let snippet = content_snippet(store, &obj, query, options).await;

            if name_match || snippet.is_some() {
                results.push(SearchMatch {
                    path: display(&obj.key),
                    size: obj.size,
                    snippet,
                });
                if results.len() >= limit {
                    return Ok(results);
                }
            }
        }

        match page.next {
            Some(next) => token = Some(next),
            None => return Ok(results),
        }
    }
}

/// Snippet for a content match, or `None` when the object is not searchable
/// or does not contain `query`.
async fn content_snippet(
    store: &dyn ObjectStore,
    obj: &ObjectEntry,
    query: &str,
    options: &ToolOptions,
) -> Option<String> {
    if classify(&obj.key, &options.extensions) != FileKind::Text
        || obj.size >= options.max_content_bytes
    {
        return None;
    }

    let bytes = match store.get(&obj.key).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(key = %obj.key, error = %e, "skipping content match");
            return None;
        }
    };

    let content = decode(&bytes);
    contains_folded(&content, query)
        .then(|| extract_snippet(&content, query, options.snippet_context))
}
