//! Virtual buckets and logical path normalization.
//!
//! A virtual bucket is a named key prefix inside one real bucket. Callers
//! address objects as `bucket/path/to/key`, optionally written with an
//! `s3://` scheme marker.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheme marker accepted in front of logical paths.
pub const SCHEME: &str = "s3://";

/// Key separator.
pub const SEPARATOR: char = '/';

/// Errors raised while building a [`BucketRegistry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two buckets share a name
    #[error("duplicate virtual bucket: {0}")]
    Duplicate(String),
    /// A bucket name is empty or contains a separator
    #[error("invalid virtual bucket name: {0:?}")]
    InvalidName(String),
    /// A bucket definition is not `NAME=DESCRIPTION`
    #[error("expected NAME=DESCRIPTION, got {0:?}")]
    Malformed(String),
}

/// A named logical partition of the real bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualBucket {
    /// Bucket name, also its key prefix.
    pub name: String,
    /// What the bucket holds.
    pub description: String,
}

impl VirtualBucket {
    /// Create a virtual bucket.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl FromStr for VirtualBucket {
    type Err = RegistryError;

    /// Parse `NAME=DESCRIPTION`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, description) = s
            .split_once('=')
            .ok_or_else(|| RegistryError::Malformed(s.to_string()))?;
        Ok(Self::new(name.trim(), description.trim()))
    }
}

/// Static list of virtual buckets, fixed at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRegistry {
    buckets: Vec<VirtualBucket>,
}

impl BucketRegistry {
    /// Build a registry, rejecting duplicate or malformed names.
    pub fn new(buckets: Vec<VirtualBucket>) -> Result<Self, RegistryError> {
        let mut seen = std::collections::HashSet::new();
        for bucket in &buckets {
            if bucket.name.is_empty() || bucket.name.contains(SEPARATOR) {
                return Err(RegistryError::InvalidName(bucket.name.clone()));
            }
            if !seen.insert(bucket.name.as_str()) {
                return Err(RegistryError::Duplicate(bucket.name.clone()));
            }
        }
        Ok(Self { buckets })
    }

    /// Build a registry from configured buckets, falling back to the
    /// default set when none are given.
    pub fn configured(buckets: Vec<VirtualBucket>) -> Result<Self, RegistryError> {
        if buckets.is_empty() {
            Ok(Self::default())
        } else {
            Self::new(buckets)
        }
    }

    /// Buckets in registration order.
    pub fn buckets(&self) -> &[VirtualBucket] {
        &self.buckets
    }
}

impl Default for BucketRegistry {
    fn default() -> Self {
        Self {
            buckets: vec![
                VirtualBucket::new("company-docs", "Company documents and policies"),
                VirtualBucket::new("engineering-docs", "Technical docs, runbooks, architecture"),
                VirtualBucket::new("data-exports", "Reports, metrics, data exports"),
            ],
        }
    }
}

/// Strip the scheme marker and surrounding separators from a logical path.
///
/// The result is usable as an object key, or as a directory name once
/// passed through [`dir_prefix`].
pub fn normalize(path: &str) -> String {
    path.replace(SCHEME, "")
        .trim_matches(SEPARATOR)
        .to_string()
}

/// Storage prefix for a normalized directory path. The root maps to `""`.
pub fn dir_prefix(clean: &str) -> String {
    if clean.is_empty() {
        String::new()
    } else {
        format!("{}{}", clean, SEPARATOR)
    }
}

/// Name of `key` relative to the listed `prefix`.
pub fn relative<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

/// Render a normalized key with the scheme marker.
pub fn display(key: &str) -> String {
    format!("{}{}", SCHEME, key)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_optional() {
        let paths = [
            "company-docs/policies/pto-policy.md",
            "/company-docs/policies/",
            "engineering-docs",
            "",
            "/",
        ];
        for p in paths {
            assert_eq!(normalize(&format!("s3://{}", p)), normalize(p), "path {:?}", p);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("s3://company-docs/policies/");
        assert_eq!(once, "company-docs/policies");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_dir_prefix() {
        assert_eq!(dir_prefix(""), "");
        assert_eq!(dir_prefix("data-exports"), "data-exports/");
    }

    #[test]
    fn test_relative_names() {
        assert_eq!(
            relative("company-docs/policies/pto-policy.md", "company-docs/policies/"),
            "pto-policy.md"
        );
        assert_eq!(relative("company-docs/hr/", "company-docs/"), "hr/");
    }

    #[test]
    fn test_default_registry() {
        let registry = BucketRegistry::default();
        let names: Vec<_> = registry.buckets().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["company-docs", "engineering-docs", "data-exports"]);
        assert_eq!(BucketRegistry::configured(Vec::new()), Ok(registry));
    }

    #[test]
    fn test_configured_buckets_are_parsed_and_validated() {
        let bucket: VirtualBucket = "legal = Contracts and NDAs".parse().unwrap();
        assert_eq!(bucket, VirtualBucket::new("legal", "Contracts and NDAs"));
        assert_eq!(
            "legal".parse::<VirtualBucket>(),
            Err(RegistryError::Malformed("legal".into()))
        );

        let registry = BucketRegistry::configured(vec![bucket.clone()]).unwrap();
        assert_eq!(registry.buckets(), [bucket]);
        assert_eq!(
            BucketRegistry::configured(vec!["=empty".parse().unwrap()]),
            Err(RegistryError::InvalidName(String::new()))
        );
    }

    #[test]
    fn test_registry_rejects_bad_names() {
        let dup = BucketRegistry::new(vec![
            VirtualBucket::new("a", "first"),
            VirtualBucket::new("a", "second"),
        ]);
        assert_eq!(dup, Err(RegistryError::Duplicate("a".into())));

        let nested = BucketRegistry::new(vec![VirtualBucket::new("a/b", "nested")]);
        assert_eq!(nested, Err(RegistryError::InvalidName("a/b".into())));
    }
}
