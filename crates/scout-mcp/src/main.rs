//! Scout MCP Server
//!
//! This binary runs Scout as an MCP server over stdio. With the `s3`
//! backend it browses the configured bucket; with the `local` backend it
//! browses a documents directory and also exposes the local source tools.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rmcp::ServiceExt;
use scout::{
    BucketRegistry, BucketTools, FsStore, LocalTools, S3Store, SourceRegistry, StoreConfig,
    VirtualBucket, config,
};
use scout_mcp::ScoutServer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    S3,
    Local,
}

#[derive(Debug, Parser)]
#[command(name = "scout-mcp", about = "MCP server for browsing document storage")]
struct Args {
    /// Storage backend to serve.
    #[arg(long, value_enum, default_value_t = Backend::S3)]
    backend: Backend,

    /// Documents directory for the local backend. Defaults to DOCUMENTS_DIR,
    /// then /documents, then ./documents.
    #[arg(long)]
    documents_dir: Option<PathBuf>,

    /// Virtual bucket to expose, as NAME=DESCRIPTION. Repeat for more.
    /// Replaces the default buckets.
    #[arg(long = "bucket", value_name = "NAME=DESCRIPTION")]
    buckets: Vec<VirtualBucket>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    tracing::info!(backend = ?args.backend, "Starting Scout MCP server");

    let registry = BucketRegistry::configured(args.buckets)?;

    let server = match args.backend {
        Backend::S3 => {
            let settings = StoreConfig::from_env();
            tracing::info!(bucket = %settings.bucket, region = %settings.region, "using S3 store");
            let store = S3Store::connect(settings).await;
            ScoutServer::new(
                BucketTools::new(Arc::new(store)).with_registry(registry),
                None,
            )
        }
        Backend::Local => {
            let root = args.documents_dir.unwrap_or_else(config::documents_dir);
            tracing::info!(root = %root.display(), "using local documents");
            let store = FsStore::new(&root).read_only();
            let local =
                LocalTools::new(root).with_sources(SourceRegistry::local_documents(&registry));
            ScoutServer::new(
                BucketTools::new(Arc::new(store)).with_registry(registry),
                Some(local),
            )
        }
    };

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("Failed to start MCP service: {}", e);
        })?;

    tracing::info!("Scout MCP server running");

    service.waiting().await?;

    tracing::info!("Scout MCP server shutting down");

    Ok(())
}
