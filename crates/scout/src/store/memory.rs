//! In-process backend with call counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Listing, ObjectEntry, ObjectPage, ObjectStore, StoreError, StoreStatus};
use crate::path::SEPARATOR;

/// Default number of objects per scan page.
const DEFAULT_PAGE_SIZE: usize = 1000;

/// Number of calls made to each [`MemoryStore`] operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    /// `list_children` calls.
    pub list_children: usize,
    /// `list_page` calls.
    pub list_page: usize,
    /// `get` calls.
    pub get: usize,
    /// `put` calls.
    pub put: usize,
}

impl StoreCalls {
    /// Total calls across operations.
    pub fn total(&self) -> usize {
        self.list_children + self.list_page + self.get + self.put
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
    modified: DateTime<Utc>,
}

/// Keys held in a sorted map, paged like an S3 listing.
#[derive(Debug)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    status: StoreStatus,
    page_size: usize,
    failing_keys: Vec<String>,
    list_children_calls: AtomicUsize,
    list_page_calls: AtomicUsize,
    get_calls: AtomicUsize,
    put_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, configured and authenticated store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            status: StoreStatus {
                configured: true,
                authenticated: true,
            },
            page_size: DEFAULT_PAGE_SIZE,
            failing_keys: Vec::new(),
            list_children_calls: AtomicUsize::new(0),
            list_page_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            put_calls: AtomicUsize::new(0),
        }
    }

    /// Create a store holding `objects`.
    pub fn with_objects<I, K, V>(objects: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let now = Utc::now();
        let map = objects
            .into_iter()
            .map(|(k, v)| {
                (
                    k.into(),
                    StoredObject {
                        data: v.into(),
                        content_type: "application/octet-stream".to_string(),
                        modified: now,
                    },
                )
            })
            .collect();
        Self {
            objects: RwLock::new(map),
            ..Self::new()
        }
    }

    /// Override the reported configuration state.
    pub fn with_status(mut self, status: StoreStatus) -> Self {
        self.status = status;
        self
    }

    /// Objects returned per scan page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make `get` fail with a backend error for `key`.
    pub fn with_failing_key(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.push(key.into());
        self
    }

    /// Calls made so far.
    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            list_children: self.list_children_calls.load(Ordering::Relaxed),
            list_page: self.list_page_calls.load(Ordering::Relaxed),
            get: self.get_calls.load(Ordering::Relaxed),
            put: self.put_calls.load(Ordering::Relaxed),
        }
    }

    /// Content type recorded for `key` by the last `put`.
    pub async fn content_type(&self, key: &str) -> Option<String> {
        let objects = self.objects.read().await;
        objects.get(key).map(|o| o.content_type.clone())
    }

    fn entry(key: &str, obj: &StoredObject) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            size: obj.data.len() as u64,
            last_modified: Some(obj.modified),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn status(&self) -> StoreStatus {
        self.status
    }

    async fn list_children(&self, prefix: &str, limit: usize) -> Result<Listing, StoreError> {
        self.list_children_calls.fetch_add(1, Ordering::Relaxed);
        let objects = self.objects.read().await;

        let mut listing = Listing::default();
        let mut count = 0;
        for (key, obj) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            if count >= limit {
                break;
            }
            match rest.find(SEPARATOR) {
                Some(pos) => {
                    let dir = format!("{}{}", prefix, &rest[..=pos]);
                    if listing.dirs.last() != Some(&dir) {
                        listing.dirs.push(dir);
                        count += 1;
                    }
                }
                None => {
                    listing.files.push(Self::entry(key, obj));
                    count += 1;
                }
            }
        }
        Ok(listing)
    }

    async fn list_page(
        &self,
        prefix: &str,
        token: Option<String>,
    ) -> Result<ObjectPage, StoreError> {
        self.list_page_calls.fetch_add(1, Ordering::Relaxed);
        let objects = self.objects.read().await;

        let start = token.unwrap_or_else(|| prefix.to_string());
        let mut page = ObjectPage::default();
        for (key, obj) in objects.range(start..) {
            if !key.starts_with(prefix) {
                break;
            }
            if page.objects.len() == self.page_size {
                page.next = Some(key.clone());
                break;
            }
            page.objects.push(Self::entry(key, obj));
        }
        Ok(page)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        if self.failing_keys.iter().any(|k| k == key) {
            return Err(StoreError::Backend(format!("injected failure for {}", key)));
        }
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.put_calls.fetch_add(1, Ordering::Relaxed);
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::with_objects([
            ("company-docs/hr/benefits.md", "Dental"),
            ("company-docs/policies/pto-policy.md", "Unlimited PTO"),
            ("company-docs/policies/security.md", "MFA"),
            ("company-docs/readme.txt", "hello"),
            ("engineering-docs/runbooks/deploy.md", "ship it"),
        ])
    }

    #[tokio::test]
    async fn test_list_children_groups_prefixes() {
        let store = store();
        let listing = store.list_children("company-docs/", 50).await.unwrap();
        assert_eq!(listing.dirs, ["company-docs/hr/", "company-docs/policies/"]);
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].key, "company-docs/readme.txt");

        let root = store.list_children("", 50).await.unwrap();
        assert_eq!(root.dirs, ["company-docs/", "engineering-docs/"]);
        assert!(root.files.is_empty());
    }

    #[tokio::test]
    async fn test_list_children_limit_counts_dirs_and_files() {
        let store = store();
        let listing = store.list_children("company-docs/", 2).await.unwrap();
        assert_eq!(listing.dirs.len(), 2);
        assert!(listing.files.is_empty());
    }

    #[tokio::test]
    async fn test_pages_follow_tokens() {
        let store = store().with_page_size(2);
        let first = store.list_page("company-docs/", None).await.unwrap();
        assert_eq!(first.objects.len(), 2);
        let second = store.list_page("company-docs/", first.next).await.unwrap();
        assert_eq!(second.objects.len(), 2);
        assert!(second.next.is_none());
        assert_eq!(store.calls().list_page, 2);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        store.put("a/b.md", b"x".to_vec(), "text/plain").await.unwrap();
        assert_eq!(store.get("a/b.md").await.unwrap(), b"x");
        assert_eq!(store.content_type("a/b.md").await.as_deref(), Some("text/plain"));
        assert!(matches!(
            store.get("a/c.md").await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(
            store.calls(),
            StoreCalls {
                put: 1,
                get: 2,
                ..Default::default()
            }
        );
    }
}
