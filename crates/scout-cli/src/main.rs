//! Scout CLI - browse a document store from the terminal
//!
//! Usage:
//!   scout buckets                         List virtual buckets
//!   scout ls company-docs/policies        List a directory
//!   scout search pto --bucket company-docs
//!   scout cat company-docs/policies/pto-policy.md
//!   echo hi | scout put company-docs/notes/hi.md
//!   scout --backend local meta company-docs

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use scout::{
    BucketRegistry, BucketTools, FsStore, LocalTools, S3Store, SourceRegistry, StoreConfig,
    VirtualBucket, config, local::FILES_SOURCE,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    S3,
    Local,
}

#[derive(Debug, Parser)]
#[command(name = "scout", about = "Browse document storage")]
struct Cli {
    /// Storage backend to browse.
    #[arg(long, value_enum, default_value_t = Backend::S3, global = true)]
    backend: Backend,

    /// Documents directory for the local backend.
    #[arg(long, global = true)]
    documents_dir: Option<PathBuf>,

    /// Virtual bucket, as NAME=DESCRIPTION. Repeat for more. Replaces the
    /// default buckets.
    #[arg(long = "bucket-def", value_name = "NAME=DESCRIPTION", global = true)]
    buckets: Vec<VirtualBucket>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List virtual buckets.
    Buckets,
    /// List files and directories under a path.
    Ls {
        path: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Search file names and contents.
    Search {
        query: String,
        #[arg(long)]
        bucket: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print a file.
    Cat { path: String },
    /// Write a file from --content or stdin.
    Put {
        path: String,
        #[arg(long)]
        content: Option<String>,
    },
    /// List knowledge sources (local backend).
    Sources {
        #[arg(long)]
        details: bool,
    },
    /// Show metadata for a path (local backend).
    Meta { path: Option<String> },
    /// Search local documents (local backend).
    Grep {
        query: String,
        #[arg(long)]
        dir: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let cli = Cli::parse();
    let root = cli.documents_dir.unwrap_or_else(config::documents_dir);

    let registry = BucketRegistry::configured(cli.buckets)?;

    let bucket = match cli.backend {
        Backend::S3 => {
            let store = S3Store::connect(StoreConfig::from_env()).await;
            BucketTools::new(Arc::new(store))
        }
        Backend::Local => BucketTools::new(Arc::new(FsStore::new(&root))),
    }
    .with_registry(registry.clone());
    let local = || -> anyhow::Result<LocalTools> {
        if cli.backend != Backend::Local {
            bail!("this command needs --backend local");
        }
        Ok(LocalTools::new(&root).with_sources(SourceRegistry::local_documents(&registry)))
    };

    let output = match cli.command {
        Command::Buckets => bucket.list_buckets(),
        Command::Ls { path, limit } => bucket.list_files(path.as_deref(), limit).await,
        Command::Search {
            query,
            bucket: scope,
            limit,
        } => bucket.search_files(&query, scope.as_deref(), limit).await,
        Command::Cat { path } => bucket.read_file(&path).await,
        Command::Put { path, content } => {
            let content = match content {
                Some(content) => content,
                None => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };
            bucket.write_file(&path, &content).await
        }
        Command::Sources { details } => local()?.list_sources(None, details),
        Command::Meta { path } => local()?.get_metadata(FILES_SOURCE, path.as_deref()).await,
        Command::Grep { query, dir, limit } => {
            local()?
                .search_content(&query, dir.as_deref(), limit)
                .await
        }
    };

    writeln!(io::stdout(), "{}", output)?;
    Ok(())
}
