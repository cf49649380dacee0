//! Local directory backend.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Listing, ObjectEntry, ObjectPage, ObjectStore, StoreError, StoreStatus};
use crate::path::SEPARATOR;

/// A directory tree addressed like a bucket.
///
/// Keys are paths relative to the root joined with `/`. A recursive scan
/// returns every file in one page, sorted by key.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    writable: bool,
}

impl FsStore {
    /// Create a writable store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writable: true,
        }
    }

    /// Refuse writes.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key or prefix to a path under the root.
    ///
    /// Keys that would leave the root are rejected.
    pub fn path_of(&self, key: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(key.trim_matches(SEPARATOR));
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(rel))
    }

    /// Every file under `dir`, as keys starting with `prefix`.
    ///
    /// Links to files are followed. Links to directories are not descended
    /// into, so a cycle cannot loop the scan.
    async fn walk(&self, dir: PathBuf, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        let mut found = Vec::new();
        let mut pending = vec![(dir, prefix.to_string())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let Some((meta, linked)) = resolve(&entry).await? else {
                    continue;
                };
                if meta.is_dir() && !linked {
                    pending.push((entry.path(), format!("{}{}{}", prefix, name, SEPARATOR)));
                } else if meta.is_file() {
                    found.push(entry_from(format!("{}{}", prefix, name), &meta));
                }
            }
        }

        found.sort_by(|a, b| Path::new(&a.key).cmp(Path::new(&b.key)));
        Ok(found)
    }
}

/// Metadata of the entry's target, and whether the entry is a link.
/// Links whose target cannot be read resolve to `None`.
async fn resolve(entry: &tokio::fs::DirEntry) -> Result<Option<(Metadata, bool)>, StoreError> {
    let linked = entry.file_type().await?.is_symlink();
    match tokio::fs::metadata(entry.path()).await {
        Ok(meta) => Ok(Some((meta, linked))),
        Err(_) if linked => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn entry_from(key: String, meta: &Metadata) -> ObjectEntry {
    ObjectEntry {
        key,
        size: meta.len(),
        last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
    }
}

fn is_not_found(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::NotFound
}

#[async_trait]
impl ObjectStore for FsStore {
    fn status(&self) -> StoreStatus {
        StoreStatus {
            configured: true,
            authenticated: self.writable,
        }
    }

    async fn list_children(&self, prefix: &str, limit: usize) -> Result<Listing, StoreError> {
        let dir = self.path_of(prefix)?;
        tracing::debug!(root = %self.root.display(), prefix = %prefix, limit, "list children");

        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(Listing::default()),
            Err(e) if is_not_found(&e) => return Ok(Listing::default()),
            Err(e) => return Err(e.into()),
        }

        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some((meta, _)) = resolve(&entry).await? {
                children.push((name, meta));
            }
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));

        let mut listing = Listing::default();
        for (name, meta) in children.into_iter().take(limit) {
            if meta.is_dir() {
                listing.dirs.push(format!("{}{}{}", prefix, name, SEPARATOR));
            } else {
                listing.files.push(entry_from(format!("{}{}", prefix, name), &meta));
            }
        }
        Ok(listing)
    }

    async fn list_page(
        &self,
        prefix: &str,
        _token: Option<String>,
    ) -> Result<ObjectPage, StoreError> {
        let dir = self.path_of(prefix)?;
        tracing::debug!(root = %self.root.display(), prefix = %prefix, "scan directory");

        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(ObjectPage::default()),
            Err(e) if is_not_found(&e) => return Ok(ObjectPage::default()),
            Err(e) => return Err(e.into()),
        }

        Ok(ObjectPage {
            objects: self.walk(dir, prefix).await?,
            next: None,
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_of(key)?;
        tracing::debug!(path = %path.display(), "read file");

        tokio::fs::read(&path).await.map_err(|e| {
            if is_not_found(&e) {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io(e)
            }
        })
    }

    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<(), StoreError> {
        let path = self.path_of(key)?;
        tracing::debug!(path = %path.display(), size = data.len(), "write file");

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(())
    }
}
