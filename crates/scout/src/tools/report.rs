//! Typed tool results and their text rendering.
//!
//! Every tool computes one of these values (or a [`ToolError`]) and only
//! turns it into text at the boundary, so the output format lives here.
//!
//! [`ToolError`]: super::ToolError

use std::fmt;

use crate::path::VirtualBucket;
use crate::text::format_size;

/// The virtual bucket registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketIndex {
    /// Registered buckets.
    pub buckets: Vec<VirtualBucket>,
}

impl fmt::Display for BucketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Available buckets:")?;
        for bucket in &self.buckets {
            write!(f, "\n  s3://{}/  -- {}", bucket.name, bucket.description)?;
        }
        Ok(())
    }
}

/// A file directly inside a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLine {
    /// Name relative to the listed directory.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Immediate children of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Normalized directory path.
    pub path: String,
    /// Subdirectory names relative to `path`, without trailing separator.
    pub dirs: Vec<String>,
    /// Files directly in `path`.
    pub files: Vec<FileLine>,
}

impl fmt::Display for DirectoryListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dirs.is_empty() && self.files.is_empty() {
            return write!(f, "No files found at `s3://{}/`", self.path);
        }
        writeln!(f, "Contents of `s3://{}/`:", self.path)?;
        for dir in &self.dirs {
            write!(f, "\n  {}/", dir)?;
        }
        for file in &self.files {
            write!(f, "\n  {}  ({})", file.name, format_size(file.size))?;
        }
        Ok(())
    }
}

/// Result of `list_files`: the registry for an empty path, a directory otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutput {
    /// No path given.
    Buckets(BucketIndex),
    /// Contents of a directory.
    Directory(DirectoryListing),
}

impl fmt::Display for ListOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListOutput::Buckets(index) => index.fmt(f),
            ListOutput::Directory(listing) => listing.fmt(f),
        }
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Path shown to the caller.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Excerpt around the content match, when the content matched.
    pub snippet: Option<String>,
}

/// Matches for a query, in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    /// The query as given.
    pub query: String,
    /// Scope phrase used when nothing matched, e.g. "across all buckets".
    pub scope: String,
    /// Hits, at most the requested limit.
    pub matches: Vec<SearchMatch>,
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matches.is_empty() {
            return write!(f, "No matches for '{}' {}.", self.query, self.scope);
        }
        writeln!(
            f,
            "Found {} match(es) for '{}':",
            self.matches.len(),
            self.query
        )?;
        for (i, m) in self.matches.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}  ({})", m.path, format_size(m.size))?;
            if let Some(snippet) = &m.snippet {
                write!(f, "\n    > {}", snippet)?;
            }
        }
        Ok(())
    }
}

/// Content of a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Decoded text.
    Text {
        /// Normalized key.
        path: String,
        /// Decoded content.
        content: String,
    },
    /// Anything not classified as text.
    Binary {
        /// Normalized key.
        path: String,
        /// Size in bytes.
        size: u64,
    },
}

impl fmt::Display for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileContent::Text { path, content } => write!(f, "## `s3://{}`\n\n{}", path, content),
            FileContent::Binary { path, size } => write!(
                f,
                "Binary file `s3://{}` ({}). Cannot display content.",
                path,
                format_size(*size)
            ),
        }
    }
}

/// Confirmation of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Normalized key written.
    pub path: String,
    /// Bytes written.
    pub size: u64,
}

impl fmt::Display for WriteReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Written to `s3://{}` ({})", self.path, format_size(self.size))
    }
}
