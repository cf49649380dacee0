//! Process-wide configuration resolved from the environment.
//!
//! Values are looked up once at startup and passed by reference into the
//! stores and tools that need them. Resolution goes through a lookup closure
//! so tests can feed a fixed map instead of mutating the process environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Bucket used when no `S3_BUCKET`/`BUCKET` variable is set.
///
/// A public sample bucket that can be read without credentials.
pub const DEFAULT_BUCKET: &str = "agno-scout-public";

/// Region used when no `S3_REGION`/`REGION` variable is set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Mount point checked for documents when `DOCUMENTS_DIR` is unset.
pub const DOCUMENTS_MOUNT: &str = "/documents";

/// Connection settings for the object store.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Real bucket name. Empty means storage is not configured.
    pub bucket: String,
    /// Store region.
    pub region: String,
    /// Custom endpoint URL for non-AWS providers. Empty uses the provider default.
    pub endpoint: String,
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl StoreConfig {
    /// Create a config for a bucket with no credentials.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Resolve the config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the config through `lookup`.
    ///
    /// Each setting checks its `S3_`-prefixed variable, then the bare one,
    /// then falls back to the static default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |primary: &str, secondary: &str, default: &str| {
            lookup(primary)
                .or_else(|| lookup(secondary))
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            bucket: resolve("S3_BUCKET", "BUCKET", DEFAULT_BUCKET),
            region: resolve("S3_REGION", "REGION", DEFAULT_REGION),
            endpoint: resolve("S3_ENDPOINT", "ENDPOINT", ""),
            access_key_id: resolve("S3_ACCESS_KEY_ID", "ACCESS_KEY_ID", ""),
            secret_access_key: resolve("S3_SECRET_ACCESS_KEY", "SECRET_ACCESS_KEY", ""),
        }
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set explicit credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.secret_access_key = secret_access_key.into();
        self
    }

    /// Whether a bucket name is present.
    pub fn is_configured(&self) -> bool {
        !self.bucket.is_empty()
    }

    /// Whether both credential fields are present.
    pub fn is_authenticated(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

/// Resolve the local documents directory from the process environment.
pub fn documents_dir() -> PathBuf {
    documents_dir_from(|key| std::env::var(key).ok(), Path::new(DOCUMENTS_MOUNT))
}

/// Resolve the documents directory: `DOCUMENTS_DIR`, then `mount` if it is a
/// directory, then `./documents`.
pub fn documents_dir_from<F>(lookup: F, mount: &Path) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("DOCUMENTS_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ if mount.is_dir() => mount.to_path_buf(),
        _ => PathBuf::from("documents"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = StoreConfig::from_lookup(|_| None);
        assert_eq!(config.bucket, DEFAULT_BUCKET);
        assert_eq!(config.region, DEFAULT_REGION);
        assert!(config.endpoint.is_empty());
        assert!(config.is_configured());
        assert!(!config.is_authenticated());
    }

    #[test]
    fn test_prefixed_variable_wins() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("S3_BUCKET", "primary"),
            ("BUCKET", "secondary"),
            ("REGION", "eu-west-1"),
        ]));
        assert_eq!(config.bucket, "primary");
        assert_eq!(config.region, "eu-west-1");
    }

    #[test]
    fn test_authenticated_needs_both_keys() {
        let config = StoreConfig::from_lookup(lookup(&[("ACCESS_KEY_ID", "id")]));
        assert!(!config.is_authenticated());

        let config = StoreConfig::from_lookup(lookup(&[
            ("S3_ACCESS_KEY_ID", "id"),
            ("SECRET_ACCESS_KEY", "secret"),
        ]));
        assert!(config.is_authenticated());
    }

    #[test]
    fn test_empty_bucket_is_not_configured() {
        let config = StoreConfig::from_lookup(lookup(&[("S3_BUCKET", "")]));
        assert!(!config.is_configured());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = StoreConfig::new("b").with_credentials("id", "very-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("authenticated: true"));
    }

    #[test]
    fn test_documents_dir_resolution() {
        let missing = Path::new("/definitely/not/a/mount");
        let dir = documents_dir_from(lookup(&[("DOCUMENTS_DIR", "/srv/docs")]), missing);
        assert_eq!(dir, PathBuf::from("/srv/docs"));

        let dir = documents_dir_from(|_| None, missing);
        assert_eq!(dir, PathBuf::from("documents"));

        let mount = tempfile::tempdir().expect("tempdir");
        let dir = documents_dir_from(|_| None, mount.path());
        assert_eq!(dir, mount.path());
    }
}
