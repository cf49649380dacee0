//! Scout: object storage browsing tools for agents
//!
//! Scout maps one real bucket into named virtual buckets by key prefix and
//! gives agents grep-like tools over it: list, search, read and write. Every
//! tool returns text, success or failure, so a calling agent never has to
//! handle a fault. A local directory backend provides the same contract for
//! offline use.

pub mod config;
pub mod local;
pub mod path;
pub mod store;
pub mod text;
pub mod tools;

pub use config::StoreConfig;
pub use local::{LocalTools, SourceRegistry};
pub use path::{BucketRegistry, VirtualBucket};
pub use store::{FsStore, MemoryStore, ObjectStore, S3Store, StoreError, StoreStatus};
pub use text::{FileKind, TextExtensions};
pub use tools::{BucketTools, ToolError, ToolOptions};
