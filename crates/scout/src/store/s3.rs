//! S3-compatible backend.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use chrono::DateTime;

use super::{Listing, ObjectEntry, ObjectPage, ObjectStore, StoreError, StoreStatus};
use crate::config::StoreConfig;
use crate::path::SEPARATOR;

/// Provider name attached to static credentials.
const CREDENTIALS_PROVIDER: &str = "scout";

/// One real bucket on an S3-compatible store.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    config: StoreConfig,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl S3Store {
    /// Build a client from `config`.
    ///
    /// With both credentials present the client signs requests and uses
    /// virtual-host addressing. Otherwise requests are unsigned, which is
    /// enough to read public buckets. Nothing is contacted here; connection
    /// problems surface on the first request.
    pub async fn connect(config: StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if !config.region.is_empty() {
            loader = loader.region(Region::new(config.region.clone()));
        }

        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(&config.endpoint);
        }

        loader = if config.is_authenticated() {
            let credentials = aws_sdk_s3::config::Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None,
                None,
                CREDENTIALS_PROVIDER,
            );
            loader.credentials_provider(credentials)
        } else {
            loader.no_credentials()
        };

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(false)
            .build();

        tracing::debug!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = %config.endpoint,
            authenticated = config.is_authenticated(),
            "created S3 client"
        );

        Self::with_client(Client::from_conf(s3_config), config)
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    /// The resolved configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

fn to_entry(obj: &aws_sdk_s3::types::Object) -> ObjectEntry {
    ObjectEntry {
        key: obj.key().unwrap_or_default().to_string(),
        size: obj.size().unwrap_or(0).max(0) as u64,
        last_modified: obj
            .last_modified()
            .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
    }
}

fn backend_error<E>(err: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::Backend(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl ObjectStore for S3Store {
    fn status(&self) -> StoreStatus {
        StoreStatus {
            configured: self.config.is_configured(),
            authenticated: self.config.is_authenticated(),
        }
    }

    async fn list_children(&self, prefix: &str, limit: usize) -> Result<Listing, StoreError> {
        tracing::debug!(bucket = %self.bucket(), prefix = %prefix, limit, "list children");

        let resp = self
            .client
            .list_objects_v2()
            .bucket(self.bucket())
            .prefix(prefix)
            .delimiter(SEPARATOR.to_string())
            .max_keys(i32::try_from(limit).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(backend_error)?;

        Ok(Listing {
            dirs: resp
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(str::to_string))
                .collect(),
            files: resp.contents().iter().map(to_entry).collect(),
        })
    }

    async fn list_page(
        &self,
        prefix: &str,
        token: Option<String>,
    ) -> Result<ObjectPage, StoreError> {
        tracing::debug!(bucket = %self.bucket(), prefix = %prefix, "list page");

        let mut req = self.client.list_objects_v2().bucket(self.bucket());
        if !prefix.is_empty() {
            req = req.prefix(prefix);
        }
        if let Some(token) = token {
            req = req.continuation_token(token);
        }

        let resp = req.send().await.map_err(backend_error)?;

        let next = if resp.is_truncated() == Some(true) {
            resp.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage {
            objects: resp.contents().iter().map(to_entry).collect(),
            next,
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        tracing::debug!(bucket = %self.bucket(), key = %key, "get object");

        let resp = match self
            .client
            .get_object()
            .bucket(self.bucket())
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let err = e.into_service_error();
                return Err(if err.is_no_such_key() {
                    StoreError::NotFound(key.to_string())
                } else {
                    backend_error(err)
                });
            }
        };

        let data = resp.body.collect().await.map_err(backend_error)?;
        Ok(data.into_bytes().to_vec())
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        tracing::debug!(bucket = %self.bucket(), key = %key, size = data.len(), "put object");

        self.client
            .put_object()
            .bucket(self.bucket())
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}
