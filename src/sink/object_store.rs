// src/sink/object_store.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::PipelineError;
use crate::sink::OutputSink;

/// Uploads to an S3-compatible HTTP endpoint as a public-read object at
/// `<bucket>/<key_prefix>/<name>`.
///
/// Requests are not signed, so the endpoint must accept anonymous writes (a
/// MinIO bucket policy, a signing gateway or a pre-authorized proxy). Plain
/// AWS S3 rejects them.
#[derive(Clone)]
pub struct ObjectStoreSink {
    client: Client,
    endpoint: Url,
    bucket: String,
    key_prefix: String,
}

impl ObjectStoreSink {
    pub fn new(client: Client, endpoint: &str, bucket: &str, key_prefix: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| anyhow!("object store endpoint {endpoint:?}: {e}"))?;
        if bucket.trim().is_empty() {
            return Err(anyhow!("object store bucket must not be empty"));
        }
        Ok(Self {
            client,
            endpoint,
            bucket: bucket.trim().to_string(),
            key_prefix: key_prefix.trim_matches('/').to_string(),
        })
    }

    pub fn key_for(&self, name: &str) -> String {
        if self.key_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.key_prefix, name)
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }

    /// Create-bucket call; an already existing bucket (409) is fine.
    async fn ensure_bucket(&self) -> Result<(), PipelineError> {
        let url = self.url_for(&self.bucket);
        let rsp = self
            .client
            .put(&url)
            .send()
            .await
            .map_err(|e| PipelineError::sink(&self.bucket, format!("create bucket: {e}")))?;

        let status = rsp.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(());
        }
        Err(PipelineError::sink(
            &self.bucket,
            format!("create bucket: HTTP {status}"),
        ))
    }
}

#[async_trait]
impl OutputSink for ObjectStoreSink {
    async fn store(&self, name: &str, bytes: Vec<u8>) -> Result<String, PipelineError> {
        self.ensure_bucket().await?;

        let key = self.key_for(name);
        let location = format!("{}/{}", self.bucket, key);
        let len = bytes.len();

        let rsp = self
            .client
            .put(self.url_for(&location))
            .header("x-amz-acl", "public-read")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes)
            .send()
            .await
            .map_err(|e| PipelineError::sink(&location, e))?;

        if let Err(e) = rsp.error_for_status_ref() {
            return Err(PipelineError::sink(&location, format!("upload: {e}")));
        }

        tracing::info!(location = %location, bytes = len, "uploaded output object");
        Ok(location)
    }

    fn name(&self) -> &'static str {
        "object-store"
    }
}
