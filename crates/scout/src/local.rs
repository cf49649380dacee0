//! Tools over a local documents directory.
//!
//! The same contract as the bucket tools, scoped to one root directory, for
//! development and offline use:
//! - `list_sources` - what knowledge sources exist
//! - `get_metadata` - structure, sizes and dates without reading content
//! - `search_content` - grep-like search over names and text content

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::path::{self, BucketRegistry, SEPARATOR, VirtualBucket};
use crate::store::{FsStore, ObjectStore};
use crate::text::{TextExtensions, count_lines, decode, format_size};
use crate::tools::{
    Action, DEFAULT_SEARCH_LIMIT, SearchReport, ToolError, ToolOptions, render, search,
};

/// Source type served by [`LocalTools`].
pub const FILES_SOURCE: &str = "files";

const MAX_CAPABILITIES: usize = 5;
const MAX_LOCATIONS: usize = 6;

/// A knowledge source an agent can consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Display name.
    pub name: String,
    /// Source type, e.g. `files`.
    pub source_type: String,
    /// What the source holds.
    pub description: String,
    /// What the source can answer.
    pub capabilities: Vec<String>,
    /// Well-known documents, as (topic, path) pairs.
    pub common_locations: Vec<(String, String)>,
    /// Top-level directories.
    pub directories: Vec<VirtualBucket>,
}

/// The sources known to the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Create a registry.
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    /// A single `files` source whose directories are the virtual buckets.
    pub fn local_documents(buckets: &BucketRegistry) -> Self {
        let loc = |topic: &str, path: &str| (topic.to_string(), path.to_string());
        Self::new(vec![Source {
            name: "Local Documents".to_string(),
            source_type: FILES_SOURCE.to_string(),
            description: "Company, engineering and data documents on local disk.".to_string(),
            capabilities: vec![
                "Browse directories and file metadata".to_string(),
                "Search file names and text content".to_string(),
                "Read markdown, text, CSV and JSON documents".to_string(),
            ],
            common_locations: vec![
                loc("PTO policy", "company-docs/policies/pto-policy.md"),
                loc("Employee handbook", "company-docs/policies/employee-handbook.md"),
                loc("Security policy", "company-docs/policies/security-policy.md"),
                loc("Benefits guide", "company-docs/hr/benefits-guide.md"),
                loc("System architecture", "engineering-docs/architecture/system-overview.md"),
                loc("Deployment runbook", "engineering-docs/runbooks/deployment.md"),
                loc("Incident response", "engineering-docs/runbooks/incident-response.md"),
            ],
            directories: buckets.buckets().to_vec(),
        }])
    }

    /// Sources in registration order.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }
}

/// Result of `list_sources`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcesReport {
    /// Filter that was applied, if any.
    pub source_type: Option<String>,
    /// Whether details were requested.
    pub include_details: bool,
    /// Sources that passed the filter.
    pub sources: Vec<Source>,
}

impl fmt::Display for SourcesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sources.is_empty() {
            return match &self.source_type {
                Some(t) => write!(f, "No sources found for type: {}", t),
                None => write!(f, "No sources configured."),
            };
        }

        let mut lines = vec!["## Available Sources".to_string(), String::new()];
        for source in &self.sources {
            lines.push(format!("### {} (`{}`)", source.name, source.source_type));
            if !source.description.is_empty() {
                lines.push(source.description.clone());
            }
            lines.push(String::new());

            if self.include_details {
                if !source.capabilities.is_empty() {
                    lines.push("**Capabilities:**".to_string());
                    for cap in source.capabilities.iter().take(MAX_CAPABILITIES) {
                        lines.push(format!("  - {}", cap));
                    }
                    lines.push(String::new());
                }
                if !source.common_locations.is_empty() {
                    lines.push("**Where to find things:**".to_string());
                    for (topic, path) in source.common_locations.iter().take(MAX_LOCATIONS) {
                        lines.push(format!("  - {}: `{}`", topic, path));
                    }
                    lines.push(String::new());
                }
                if source.source_type == FILES_SOURCE && !source.directories.is_empty() {
                    lines.push("**Directories:**".to_string());
                    for dir in &source.directories {
                        lines.push(format!("  - **{}**: {}", dir.name, dir.description));
                    }
                    lines.push(String::new());
                }
            }
            lines.push(String::new());
        }
        f.write_str(&lines.join("\n"))
    }
}

/// One entry of a directory overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEntry {
    /// A subdirectory and the number of files below it.
    Dir {
        /// Directory name.
        name: String,
        /// Files anywhere below the directory.
        files: usize,
    },
    /// A file.
    File {
        /// File name.
        name: String,
        /// Size in bytes.
        size: u64,
        /// Last modification time.
        modified: Option<DateTime<Utc>>,
    },
}

/// Result of `get_metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataReport {
    /// Top level of the documents root.
    Root {
        /// Entries sorted by name.
        entries: Vec<MetadataEntry>,
    },
    /// A single file.
    File {
        /// Normalized path.
        path: String,
        /// Size in bytes.
        size: u64,
        /// Last modification time.
        modified: Option<DateTime<Utc>>,
        /// Line count, for common text formats.
        lines: Option<usize>,
    },
    /// A directory below the root.
    Directory {
        /// Normalized path.
        path: String,
        /// Entries sorted by name.
        entries: Vec<MetadataEntry>,
    },
}

fn format_date(modified: Option<DateTime<Utc>>) -> String {
    modified
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl fmt::Display for MetadataReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataReport::Root { entries } => {
                if entries.is_empty() {
                    return write!(f, "## Data Directory\n\nEmpty directory.");
                }
                writeln!(f, "## Data Directory Structure")?;
                for entry in entries {
                    match entry {
                        MetadataEntry::Dir { name, files } => {
                            write!(f, "\n[dir] **{}/**  ({} files)", name, files)?
                        }
                        MetadataEntry::File { name, size, .. } => {
                            write!(f, "\n[file] {}  ({})", name, format_size(*size))?
                        }
                    }
                }
                Ok(())
            }
            MetadataReport::File {
                path,
                size,
                modified,
                lines,
            } => {
                writeln!(f, "## File: {}", path)?;
                write!(f, "\n**Size:** {}", format_size(*size))?;
                write!(f, "\n**Modified:** {}", format_date(*modified))?;
                if let Some(lines) = lines {
                    write!(f, "\n**Lines:** {}", lines)?;
                }
                Ok(())
            }
            MetadataReport::Directory { path, entries } => {
                if entries.is_empty() {
                    return write!(f, "Empty directory: {}", path);
                }
                writeln!(f, "## Contents of {}", path)?;
                for entry in entries {
                    match entry {
                        MetadataEntry::Dir { name, files } => {
                            write!(f, "\n[dir] **{}/**  ({} files)", name, files)?
                        }
                        MetadataEntry::File {
                            name,
                            size,
                            modified,
                        } => write!(
                            f,
                            "\n[file] {} ({}) - {}",
                            name,
                            format_size(*size),
                            format_date(*modified)
                        )?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Awareness and search tools over a local documents root.
#[derive(Debug, Clone)]
pub struct LocalTools {
    store: FsStore,
    sources: SourceRegistry,
    options: ToolOptions,
}

impl LocalTools {
    /// Create tools rooted at `root` with the default source registry.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: FsStore::new(root).read_only(),
            sources: SourceRegistry::local_documents(&BucketRegistry::default()),
            options: ToolOptions::default(),
        }
    }

    /// Use a custom source registry.
    pub fn with_sources(mut self, sources: SourceRegistry) -> Self {
        self.sources = sources;
        self
    }

    /// Use custom options.
    pub fn with_options(mut self, options: ToolOptions) -> Self {
        self.options = options;
        self
    }

    /// Documents root.
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Describe the configured sources.
    pub fn list_sources(&self, source_type: Option<&str>, include_details: bool) -> String {
        self.try_list_sources(source_type, include_details).to_string()
    }

    /// Typed form of [`list_sources`](Self::list_sources).
    pub fn try_list_sources(&self, source_type: Option<&str>, include_details: bool) -> SourcesReport {
        let source_type = source_type.filter(|t| !t.is_empty());
        let sources = self
            .sources
            .sources()
            .iter()
            .filter(|s| source_type.is_none_or(|t| s.source_type == t))
            .cloned()
            .collect();
        SourcesReport {
            source_type: source_type.map(str::to_string),
            include_details,
            sources,
        }
    }

    /// Inspect the root, a directory or a file without reading content.
    pub async fn get_metadata(&self, source: &str, path: Option<&str>) -> String {
        render(self.try_get_metadata(source, path).await)
    }

    /// Typed form of [`get_metadata`](Self::get_metadata).
    pub async fn try_get_metadata(
        &self,
        source: &str,
        path: Option<&str>,
    ) -> Result<MetadataReport, ToolError> {
        if source != FILES_SOURCE {
            return Err(ToolError::UnknownSource(source.to_string()));
        }
        if !self.root().is_dir() {
            return Err(ToolError::DataDirMissing(self.root().display().to_string()));
        }

        let inspect = |e| ToolError::store(Action::Inspecting, source, e);

        let path = match path.filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => {
                let entries = self.entries("").await.map_err(inspect)?;
                return Ok(MetadataReport::Root { entries });
            }
        };

        let clean = path.trim_matches(SEPARATOR).to_string();
        let target = self.store.path_of(&clean).map_err(inspect)?;

        match tokio::fs::metadata(&target).await {
            Ok(meta) if meta.is_file() => {
                let lines = if TextExtensions::line_countable().matches(&clean) {
                    self.store
                        .get(&clean)
                        .await
                        .ok()
                        .map(|bytes| count_lines(&decode(&bytes)))
                } else {
                    None
                };
                Ok(MetadataReport::File {
                    size: meta.len(),
                    modified: meta.modified().ok().map(DateTime::<Utc>::from),
                    lines,
                    path: clean,
                })
            }
            Ok(meta) if meta.is_dir() => {
                let entries = self
                    .entries(&path::dir_prefix(&clean))
                    .await
                    .map_err(inspect)?;
                Ok(MetadataReport::Directory {
                    path: clean,
                    entries,
                })
            }
            _ => Err(ToolError::PathNotFound(path.to_string())),
        }
    }

    /// Entries directly under `prefix`, sorted by name, with recursive file
    /// counts for directories.
    async fn entries(&self, prefix: &str) -> Result<Vec<MetadataEntry>, crate::store::StoreError> {
        let listing = self.store.list_children(prefix, usize::MAX).await?;

        let mut entries = Vec::with_capacity(listing.dirs.len() + listing.files.len());
        for dir in &listing.dirs {
            let files = self.store.list_page(dir, None).await?.objects.len();
            entries.push(MetadataEntry::Dir {
                name: path::relative(dir, prefix)
                    .trim_end_matches(SEPARATOR)
                    .to_string(),
                files,
            });
        }
        for file in listing.files {
            entries.push(MetadataEntry::File {
                name: path::relative(&file.key, prefix).to_string(),
                size: file.size,
                modified: file.last_modified,
            });
        }

        entries.sort_by(|a, b| entry_name(a).cmp(entry_name(b)));
        Ok(entries)
    }

    /// Search names and text content under the root or one directory.
    pub async fn search_content(
        &self,
        query: &str,
        directory: Option<&str>,
        limit: Option<usize>,
    ) -> String {
        render(self.try_search_content(query, directory, limit).await)
    }

    /// Typed form of [`search_content`](Self::search_content).
    pub async fn try_search_content(
        &self,
        query: &str,
        directory: Option<&str>,
        limit: Option<usize>,
    ) -> Result<SearchReport, ToolError> {
        let directory = directory.filter(|d| !d.is_empty());
        let prefix = match directory {
            Some(dir) => {
                let clean = dir.trim_matches(SEPARATOR).to_string();
                let is_dir = self
                    .store
                    .path_of(&clean)
                    .map(|p| p.is_dir())
                    .unwrap_or(false);
                if !is_dir {
                    return Err(ToolError::DirectoryNotFound(clean));
                }
                path::dir_prefix(&clean)
            }
            None => String::new(),
        };
        if !self.root().is_dir() {
            return Err(ToolError::DataDirMissing(self.root().display().to_string()));
        }

        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        tracing::debug!(query = %query, prefix = %prefix, limit, "search content");

        let matches = search::scan(
            &self.store,
            query,
            &prefix,
            limit,
            &self.options,
            str::to_string,
        )
        .await
        .map_err(|e| ToolError::store(Action::Searching, format!("'{}'", query), e))?;

        let scope = match directory {
            Some(d) => format!("in `{}`", d),
            None => "across all directories".to_string(),
        };

        Ok(SearchReport {
            query: query.to_string(),
            scope,
            matches,
        })
    }
}

fn entry_name(entry: &MetadataEntry) -> &str {
    match entry {
        MetadataEntry::Dir { name, .. } | MetadataEntry::File { name, .. } => name,
    }
}
