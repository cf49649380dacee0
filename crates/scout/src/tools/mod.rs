//! Object storage browsing tools for agents.
//!
//! Each tool has a `try_*` form returning a typed report or a [`ToolError`],
//! and a plain form that renders either outcome as text. The plain forms
//! never fail, so an agent can always read the result and carry on.

mod report;
pub mod search;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use report::{
    BucketIndex, DirectoryListing, FileContent, FileLine, ListOutput, SearchMatch, SearchReport,
    WriteReceipt,
};

use crate::path::{self, BucketRegistry};
use crate::store::{ObjectStore, StoreError};
use crate::text::{FileKind, SNIPPET_CONTEXT_CHARS, TextExtensions, classify, decode};

/// Default number of entries returned by `list_files`.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Default number of matches returned by `search_files`.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Objects at or above this size are only matched by key.
pub const MAX_CONTENT_SEARCH_BYTES: u64 = 500_000;

/// Content type used for uploads.
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Tunables shared by the tool sets.
#[derive(Debug, Clone)]
pub struct ToolOptions {
    /// Extensions treated as text.
    pub extensions: TextExtensions,
    /// Content search size ceiling in bytes (exclusive).
    pub max_content_bytes: u64,
    /// Characters of context on each side of a snippet hit.
    pub snippet_context: usize,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            extensions: TextExtensions::default(),
            max_content_bytes: MAX_CONTENT_SEARCH_BYTES,
            snippet_context: SNIPPET_CONTEXT_CHARS,
        }
    }
}

/// The operation a storage failure interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Listing a directory
    Listing,
    /// Scanning for a query
    Searching,
    /// Reading an object
    Reading,
    /// Writing an object
    Writing,
    /// Inspecting local metadata
    Inspecting,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Listing => "listing",
            Action::Searching => "searching for",
            Action::Reading => "reading",
            Action::Writing => "writing to",
            Action::Inspecting => "inspecting",
        })
    }
}

/// Why a tool could not produce its report.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No bucket is configured
    #[error("Error: S3 storage is not configured.")]
    NotConfigured,
    /// A write was attempted without credentials
    #[error("Error: Write access requires authenticated S3 credentials.")]
    NotAuthenticated,
    /// The object does not exist
    #[error("File not found: `{0}`")]
    NotFound(String),
    /// A search scope directory does not exist
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    /// The local documents root does not exist
    #[error("Data directory not found: {0}")]
    DataDirMissing(String),
    /// A metadata request named an unknown source
    #[error("Unknown source: {0}. Available: files")]
    UnknownSource(String),
    /// A metadata path is neither a file nor a directory
    #[error("Path not found: {0}")]
    PathNotFound(String),
    /// The store failed
    #[error("Error {action} {target}: {source}")]
    Store {
        /// What was being done
        action: Action,
        /// What it was being done to, already quoted for display
        target: String,
        /// Underlying failure
        #[source]
        source: StoreError,
    },
}

impl ToolError {
    pub(crate) fn store(action: Action, target: impl Into<String>, source: StoreError) -> Self {
        ToolError::Store {
            action,
            target: target.into(),
            source,
        }
    }
}

/// Render a tool outcome as text.
pub fn render<T: fmt::Display>(result: Result<T, ToolError>) -> String {
    match result {
        Ok(report) => report.to_string(),
        Err(err) => err.to_string(),
    }
}

/// List, search, read and write objects across virtual buckets.
#[derive(Clone)]
pub struct BucketTools {
    store: Arc<dyn ObjectStore>,
    registry: BucketRegistry,
    options: ToolOptions,
}

impl fmt::Debug for BucketTools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketTools")
            .field("status", &self.store.status())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl BucketTools {
    /// Create tools over `store` with the default registry and options.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            registry: BucketRegistry::default(),
            options: ToolOptions::default(),
        }
    }

    /// Use a custom virtual bucket registry.
    pub fn with_registry(mut self, registry: BucketRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use custom options.
    pub fn with_options(mut self, options: ToolOptions) -> Self {
        self.options = options;
        self
    }

    fn ensure_configured(&self) -> Result<(), ToolError> {
        if self.store.status().configured {
            Ok(())
        } else {
            Err(ToolError::NotConfigured)
        }
    }

    /// List the virtual buckets.
    pub fn list_buckets(&self) -> String {
        render(self.try_list_buckets())
    }

    /// Typed form of [`list_buckets`](Self::list_buckets).
    pub fn try_list_buckets(&self) -> Result<BucketIndex, ToolError> {
        self.ensure_configured()?;
        Ok(BucketIndex {
            buckets: self.registry.buckets().to_vec(),
        })
    }

    /// List the immediate children of `path`, or the buckets when `path`
    /// is empty.
    pub async fn list_files(&self, path: Option<&str>, limit: Option<usize>) -> String {
        render(self.try_list_files(path, limit).await)
    }

    /// Typed form of [`list_files`](Self::list_files).
    pub async fn try_list_files(
        &self,
        path: Option<&str>,
        limit: Option<usize>,
    ) -> Result<ListOutput, ToolError> {
        self.ensure_configured()?;

        let path = match path {
            Some(p) if !p.trim().is_empty() => p,
            _ => return self.try_list_buckets().map(ListOutput::Buckets),
        };

        let clean = path::normalize(path);
        let prefix = path::dir_prefix(&clean);
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        tracing::debug!(path = %clean, limit, "list files");

        let listing = self
            .store
            .list_children(&prefix, limit)
            .await
            .map_err(|e| ToolError::store(Action::Listing, format!("`s3://{}/`", clean), e))?;

        let dirs = listing
            .dirs
            .iter()
            .map(|d| {
                path::relative(d, &prefix)
                    .trim_end_matches(path::SEPARATOR)
                    .to_string()
            })
            .collect();
        let files = listing
            .files
            .into_iter()
            .filter(|f| f.key != prefix)
            .map(|f| FileLine {
                name: path::relative(&f.key, &prefix).to_string(),
                size: f.size,
            })
            .collect();

        Ok(ListOutput::Directory(DirectoryListing {
            path: clean,
            dirs,
            files,
        }))
    }

    /// Search keys and text content for `query`, optionally within one bucket.
    pub async fn search_files(
        &self,
        query: &str,
        bucket: Option<&str>,
        limit: Option<usize>,
    ) -> String {
        render(self.try_search_files(query, bucket, limit).await)
    }

    /// Typed form of [`search_files`](Self::search_files).
    pub async fn try_search_files(
        &self,
        query: &str,
        bucket: Option<&str>,
        limit: Option<usize>,
    ) -> Result<SearchReport, ToolError> {
        self.ensure_configured()?;

        let bucket = bucket.filter(|b| !b.is_empty());
        let prefix = bucket
            .map(|b| path::dir_prefix(&path::normalize(b)))
            .unwrap_or_default();
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        tracing::debug!(query = %query, prefix = %prefix, limit, "search files");

        let matches = search::scan(
            self.store.as_ref(),
            query,
            &prefix,
            limit,
            &self.options,
            path::display,
        )
        .await
        .map_err(|e| ToolError::store(Action::Searching, format!("'{}'", query), e))?;

        let scope = match bucket {
            Some(b) => format!("in `{}`", b),
            None => "across all buckets".to_string(),
        };

        Ok(SearchReport {
            query: query.to_string(),
            scope,
            matches,
        })
    }

    /// Read an object as text, or describe it when it is binary.
    pub async fn read_file(&self, path: &str) -> String {
        render(self.try_read_file(path).await)
    }

    /// Typed form of [`read_file`](Self::read_file).
    pub async fn try_read_file(&self, path: &str) -> Result<FileContent, ToolError> {
        self.ensure_configured()?;

        let key = path::normalize(path);
        tracing::debug!(key = %key, "read file");

        let bytes = self.store.get(&key).await.map_err(|e| match e {
            StoreError::NotFound(_) => ToolError::NotFound(path::display(&key)),
            e => ToolError::store(Action::Reading, format!("`{}`", path::display(&key)), e),
        })?;

        Ok(match classify(&key, &self.options.extensions) {
            FileKind::Text => FileContent::Text {
                path: key,
                content: decode(&bytes),
            },
            FileKind::Binary => FileContent::Binary {
                path: key,
                size: bytes.len() as u64,
            },
        })
    }

    /// Upload `content` as UTF-8 text. Requires authenticated access.
    pub async fn write_file(&self, path: &str, content: &str) -> String {
        render(self.try_write_file(path, content).await)
    }

    /// Typed form of [`write_file`](Self::write_file).
    pub async fn try_write_file(&self, path: &str, content: &str) -> Result<WriteReceipt, ToolError> {
        let status = self.store.status();
        if !status.authenticated {
            return Err(ToolError::NotAuthenticated);
        }
        if !status.configured {
            return Err(ToolError::NotConfigured);
        }

        let key = path::normalize(path);
        let data = content.as_bytes().to_vec();
        let size = data.len() as u64;
        tracing::debug!(key = %key, size, "write file");

        self.store
            .put(&key, data, TEXT_CONTENT_TYPE)
            .await
            .map_err(|e| ToolError::store(Action::Writing, format!("`{}`", path::display(&key)), e))?;

        tracing::info!(key = %key, size, "wrote object");
        Ok(WriteReceipt { path: key, size })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreStatus};

    fn tools(store: MemoryStore) -> (Arc<MemoryStore>, BucketTools) {
        let store = Arc::new(store);
        let tools = BucketTools::new(store.clone());
        (store, tools)
    }

    #[test]
    fn test_error_messages() {
        let err = ToolError::store(
            Action::Listing,
            "`s3://a/`",
            StoreError::Backend("AccessDenied".into()),
        );
        assert_eq!(err.to_string(), "Error listing `s3://a/`: AccessDenied");

        let err = ToolError::store(
            Action::Searching,
            "'q'",
            StoreError::Backend("timeout".into()),
        );
        assert_eq!(err.to_string(), "Error searching for 'q': timeout");
        assert_eq!(
            ToolError::NotFound("s3://a/b.md".into()).to_string(),
            "File not found: `s3://a/b.md`"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_store_fails_fast() {
        let (store, tools) = tools(MemoryStore::new().with_status(StoreStatus {
            configured: false,
            authenticated: false,
        }));
        let expected = "Error: S3 storage is not configured.";
        assert_eq!(tools.list_buckets(), expected);
        assert_eq!(tools.list_files(Some("a"), None).await, expected);
        assert_eq!(tools.search_files("a", None, None).await, expected);
        assert_eq!(tools.read_file("a/b.md").await, expected);
        assert_eq!(store.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_blank_path_lists_buckets_without_store_call() {
        let (store, tools) = tools(MemoryStore::new());
        let out = tools.list_files(Some("  "), None).await;
        assert_eq!(out, tools.list_buckets());
        assert!(out.contains("s3://engineering-docs/  -- Technical docs"));
        assert_eq!(store.calls().total(), 0);
    }

    #[test]
    fn test_custom_registry_replaces_defaults() {
        let registry = BucketRegistry::new(vec![crate::path::VirtualBucket::new(
            "legal",
            "Contracts and NDAs",
        )])
        .unwrap();
        let (_, tools) = tools(MemoryStore::new());
        let tools = tools.with_registry(registry);
        assert_eq!(
            tools.list_buckets(),
            "Available buckets:\n\n  s3://legal/  -- Contracts and NDAs"
        );
    }

    #[tokio::test]
    async fn test_directory_marker_is_skipped() {
        let (_, tools) = tools(MemoryStore::with_objects([
            ("notes/", ""),
            ("notes/a.md", "a"),
        ]));
        let out = tools.try_list_files(Some("s3://notes/"), None).await.unwrap();
        match out {
            ListOutput::Directory(listing) => {
                assert_eq!(listing.path, "notes");
                assert_eq!(
                    listing.files,
                    [FileLine {
                        name: "a.md".into(),
                        size: 1
                    }]
                );
            }
            other => panic!("expected directory listing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_missing_key_is_distinct() {
        let (_, tools) = tools(MemoryStore::new().with_failing_key("a/broken.md"));
        assert_eq!(
            tools.read_file("s3://a/missing.md").await,
            "File not found: `s3://a/missing.md`"
        );
        assert_eq!(
            tools.read_file("a/broken.md").await,
            "Error reading `s3://a/broken.md`: injected failure for a/broken.md"
        );
    }

    #[tokio::test]
    async fn test_custom_extensions_change_classification() {
        let (_, tools) = tools(MemoryStore::with_objects([("a/data.bin", "plain words")]));
        assert!(tools.read_file("a/data.bin").await.starts_with("Binary file"));

        let tools = tools.with_options(ToolOptions {
            extensions: TextExtensions::new([".bin"]),
            ..Default::default()
        });
        assert_eq!(
            tools.read_file("a/data.bin").await,
            "## `s3://a/data.bin`\n\nplain words"
        );
    }
}
