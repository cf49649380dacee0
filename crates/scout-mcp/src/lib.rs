//! Scout MCP Server
//!
//! An MCP server that exposes Scout's storage browsing tools. Agents use it
//! to list, search, read and write documents in virtual buckets, and to
//! inspect a local documents directory when one is attached.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::*,
    schemars::{self, JsonSchema},
    service::{RequestContext, RoleServer},
};
use scout::{BucketTools, LocalTools};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Parameters for `list_buckets`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListBucketsParams {}

/// Parameters for `list_files`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListFilesParams {
    /// Path like 'company-docs/policies/' or 's3://company-docs/'.
    /// Omit to list all buckets.
    #[serde(default)]
    pub path: Option<String>,

    /// Max entries to return (default 50).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for `search_files`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchFilesParams {
    /// Search term matched against file names and file contents.
    pub query: String,

    /// Optional bucket to scope the search (e.g. 'company-docs').
    /// Searches all buckets if omitted.
    #[serde(default)]
    pub bucket: Option<String>,

    /// Max results to return (default 10).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for `read_file`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    /// File path like 'company-docs/policies/pto-policy.md'.
    pub path: String,
}

/// Parameters for `write_file`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    /// Destination path like 'company-docs/notes/my-note.md'.
    pub path: String,

    /// Text content to write.
    pub content: String,
}

/// Parameters for `list_sources`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListSourcesParams {
    /// Only list sources of this type (e.g. 'files').
    #[serde(default)]
    pub source_type: Option<String>,

    /// Include capabilities, common locations and directories.
    #[serde(default)]
    pub include_details: bool,
}

/// Parameters for `get_metadata`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetMetadataParams {
    /// Source type (files).
    pub source: String,

    /// Optional path to inspect, e.g. 'company-docs' or
    /// 'company-docs/policies/employee-handbook.md'. Omit for the top level.
    #[serde(default)]
    pub path: Option<String>,
}

/// Parameters for `search_content`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchContentParams {
    /// Search term matched against file names and file contents.
    pub query: String,

    /// Optional directory to scope the search (e.g. 'company-docs').
    #[serde(default)]
    pub directory: Option<String>,

    /// Max results to return (default 10).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// MCP Server that provides document browsing via Scout
#[derive(Clone)]
pub struct ScoutServer {
    bucket: Arc<BucketTools>,
    local: Option<Arc<LocalTools>>,
}

impl std::fmt::Debug for ScoutServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoutServer")
            .field("local", &self.local.is_some())
            .finish_non_exhaustive()
    }
}

/// Build a tool definition whose input schema is derived from `P`.
fn tool<P: JsonSchema>(name: &'static str, title: &'static str, description: &'static str) -> Tool {
    let schema = schemars::schema_for!(P);
    let schema_json = serde_json::to_value(schema).unwrap_or_default();
    let input_schema = match schema_json {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };

    Tool {
        name: name.into(),
        title: Some(title.into()),
        description: Some(description.into()),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

/// Decode tool arguments. Missing arguments decode as an empty object, so
/// tools without required parameters can be called bare.
fn parse<P: DeserializeOwned>(arguments: &Option<JsonObject>) -> Result<P, McpError> {
    let args = arguments.clone().unwrap_or_default();
    serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))
}

fn text(output: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(output)])
}

impl ScoutServer {
    /// Create a server over bucket tools, optionally with local tools.
    pub fn new(bucket: BucketTools, local: Option<LocalTools>) -> Self {
        Self {
            bucket: Arc::new(bucket),
            local: local.map(Arc::new),
        }
    }

    /// Definitions of every tool this server answers.
    pub fn tools(&self) -> Vec<Tool> {
        let mut tools = vec![
            tool::<ListBucketsParams>(
                "list_buckets",
                "List Buckets",
                "List available buckets (virtual buckets organized by topic).",
            ),
            tool::<ListFilesParams>(
                "list_files",
                "List Files",
                "List files and directories in a bucket path. Omit the path to list all buckets.",
            ),
            tool::<SearchFilesParams>(
                "search_files",
                "Search Files",
                "Search for files by name or content (grep-like). Returns the first matches \
                found, with a snippet around each content match.",
            ),
            tool::<ReadFileParams>(
                "read_file",
                "Read File",
                "Read the full content of a file. Binary files are described, not returned.",
            ),
            tool::<WriteFileParams>(
                "write_file",
                "Write File",
                "Write text content to a file (requires authenticated access).",
            ),
        ];

        if self.local.is_some() {
            tools.extend([
                tool::<ListSourcesParams>(
                    "list_sources",
                    "List Sources",
                    "List available knowledge sources. Start here if you're unsure where to look.",
                ),
                tool::<GetMetadataParams>(
                    "get_metadata",
                    "Get Metadata",
                    "Get metadata about a source or path without reading content: directories, \
                    file counts, sizes and dates.",
                ),
                tool::<SearchContentParams>(
                    "search_content",
                    "Search Content",
                    "Search local documents by name or content (grep-like).",
                ),
            ]);
        }
        tools
    }

    /// Dispatch a tool call by name.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = name, "tool call");

        match (name, self.local.as_deref()) {
            ("list_buckets", _) => {
                let _: ListBucketsParams = parse(arguments)?;
                Ok(text(self.bucket.list_buckets()))
            }
            ("list_files", _) => {
                let p: ListFilesParams = parse(arguments)?;
                Ok(text(self.bucket.list_files(p.path.as_deref(), p.limit).await))
            }
            ("search_files", _) => {
                let p: SearchFilesParams = parse(arguments)?;
                Ok(text(
                    self.bucket
                        .search_files(&p.query, p.bucket.as_deref(), p.limit)
                        .await,
                ))
            }
            ("read_file", _) => {
                let p: ReadFileParams = parse(arguments)?;
                Ok(text(self.bucket.read_file(&p.path).await))
            }
            ("write_file", _) => {
                let p: WriteFileParams = parse(arguments)?;
                Ok(text(self.bucket.write_file(&p.path, &p.content).await))
            }
            ("list_sources", Some(local)) => {
                let p: ListSourcesParams = parse(arguments)?;
                Ok(text(
                    local.list_sources(p.source_type.as_deref(), p.include_details),
                ))
            }
            ("get_metadata", Some(local)) => {
                let p: GetMetadataParams = parse(arguments)?;
                Ok(text(local.get_metadata(&p.source, p.path.as_deref()).await))
            }
            ("search_content", Some(local)) => {
                let p: SearchContentParams = parse(arguments)?;
                Ok(text(
                    local
                        .search_content(&p.query, p.directory.as_deref(), p.limit)
                        .await,
                ))
            }
            _ => Err(McpError::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            )),
        }
    }
}

impl ServerHandler for ScoutServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Scout browses document storage organized into virtual buckets. Start with \
                'list_buckets', narrow down with 'list_files' or 'search_files', then use \
                'read_file' to read the full document. Every tool returns text, including \
                errors."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(request.name.as_ref(), &request.arguments).await
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use scout::MemoryStore;

    fn server(local: Option<LocalTools>) -> ScoutServer {
        let store = MemoryStore::with_objects([(
            "company-docs/policies/pto-policy.md",
            "Unlimited PTO for everyone.",
        )]);
        ScoutServer::new(BucketTools::new(Arc::new(store)), local)
    }

    async fn call(
        server: &ScoutServer,
        name: &str,
        args: serde_json::Value,
    ) -> Result<CallToolResult, McpError> {
        server.dispatch(name, &args.as_object().cloned()).await
    }

    fn output(result: &CallToolResult) -> String {
        let json = serde_json::to_value(result).unwrap();
        json["content"][0]["text"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_list_files_params_defaults() {
        let params: ListFilesParams = serde_json::from_str("{}").expect("parse failed");
        assert!(params.path.is_none());
        assert!(params.limit.is_none());
    }

    #[test]
    fn test_search_params_require_query() {
        let err = serde_json::from_str::<SearchFilesParams>(r#"{"bucket": "a"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_local_tools_only_listed_when_attached() {
        let names = |s: &ScoutServer| -> Vec<String> {
            s.tools().iter().map(|t| t.name.to_string()).collect()
        };
        assert_eq!(
            names(&server(None)),
            ["list_buckets", "list_files", "search_files", "read_file", "write_file"]
        );
        let with_local = server(Some(LocalTools::new("/nonexistent")));
        assert_eq!(names(&with_local).len(), 8);
    }

    #[tokio::test]
    async fn test_dispatch_read_file() {
        let server = server(None);
        let result = call(
            &server,
            "read_file",
            serde_json::json!({"path": "s3://company-docs/policies/pto-policy.md"}),
        )
        .await
        .unwrap();
        assert_eq!(
            output(&result),
            "## `s3://company-docs/policies/pto-policy.md`\n\nUnlimited PTO for everyone."
        );
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_and_detached_tools() {
        let server = server(None);
        let empty = || serde_json::json!({});
        assert!(call(&server, "rm_rf", empty()).await.is_err());
        assert!(call(&server, "list_sources", empty()).await.is_err());
        assert!(call(&server, "read_file", empty()).await.is_err());

        let listed = call(&server, "list_buckets", empty()).await.unwrap();
        assert!(output(&listed).starts_with("Available buckets:"));
    }
}
