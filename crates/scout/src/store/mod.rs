//! Storage backends behind the browsing tools.
//!
//! This module provides:
//! - [`ObjectStore`] - the capability every backend implements
//! - [`S3Store`] - one real S3-compatible bucket
//! - [`FsStore`] - a local directory tree addressed with `/`-joined keys
//! - [`MemoryStore`] - an in-process map with call counters
//!
//! Keys never start with a separator. Directory prefixes always end in one,
//! except the root prefix which is empty.

mod fs;
mod memory;
mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use fs::FsStore;
pub use memory::{MemoryStore, StoreCalls};
pub use s3::S3Store;

/// Errors returned by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist
    #[error("object not found: {0}")]
    NotFound(String),
    /// The key cannot be addressed by this backend
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Local IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error reported by the remote store or its transport
    #[error("{0}")]
    Backend(String),
}

/// Configuration state of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    /// A bucket (or root) is configured.
    pub configured: bool,
    /// Writes are permitted.
    pub authenticated: bool,
}

/// An object found by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectEntry {
    /// Create an entry without a timestamp.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
        }
    }
}

/// Immediate children of a prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Common prefixes (subdirectories), as full keys ending in `/`.
    pub dirs: Vec<String>,
    /// Objects directly under the prefix.
    pub files: Vec<ObjectEntry>,
}

impl Listing {
    /// Whether the listing has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

/// One page of a recursive scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Objects on this page, in store order.
    pub objects: Vec<ObjectEntry>,
    /// Token for the next page; `None` when the scan is complete.
    pub next: Option<String>,
}

/// Capability shared by all storage backends.
///
/// Implementations must be thread-safe for use across async tasks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Configuration state used to gate the tools.
    fn status(&self) -> StoreStatus;

    /// List the immediate children of `prefix`, at most `limit` entries
    /// counting subdirectories and files together.
    async fn list_children(&self, prefix: &str, limit: usize) -> Result<Listing, StoreError>;

    /// Fetch one page of every object under `prefix`, recursing into
    /// subdirectories. Pass the previous page's `next` token to continue.
    async fn list_page(&self, prefix: &str, token: Option<String>)
    -> Result<ObjectPage, StoreError>;

    /// Fetch an object's bytes. A missing key is [`StoreError::NotFound`].
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Store an object.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StoreError>;
}
