// src/sink/mod.rs
pub mod local;
pub mod object_store;

use std::sync::Arc;

use anyhow::Result;

use crate::config::{Config, SinkMode};
use crate::error::PipelineError;

pub use local::LocalFileSink;
pub use object_store::ObjectStoreSink;

#[async_trait::async_trait]
pub trait OutputSink: Send + Sync {
    /// Deliver the whole document under `name`. Returns where it landed
    /// (a file path or `bucket/key`).
    async fn store(&self, name: &str, bytes: Vec<u8>) -> Result<String, PipelineError>;
    fn name(&self) -> &'static str;
}

/// Pick the one sink this process will use, based on config.
pub fn select_sink(cfg: &Config, client: reqwest::Client) -> Result<Arc<dyn OutputSink>> {
    let sink: Arc<dyn OutputSink> = match cfg.sink_mode {
        SinkMode::Local => Arc::new(LocalFileSink::new(&cfg.output_dir)),
        SinkMode::ObjectStore => Arc::new(ObjectStoreSink::new(
            client,
            cfg.object_store_endpoint
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("object-store sink needs an endpoint"))?,
            &cfg.bucket,
            &cfg.key_prefix,
        )?),
    };
    tracing::info!(sink = sink.name(), "output sink selected");
    Ok(sink)
}

// --- Test helper ---
pub struct MemorySink {
    pub calls: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(vec![]),
        }
    }

    /// Bytes of the most recent `store` call.
    pub fn last(&self) -> Option<Vec<u8>> {
        self.calls
            .lock()
            .ok()
            .and_then(|c| c.last().map(|(_, b)| b.clone()))
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl OutputSink for MemorySink {
    async fn store(&self, name: &str, bytes: Vec<u8>) -> Result<String, PipelineError> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|_| PipelineError::sink(name, "memory sink lock poisoned"))?;
        calls.push((name.to_string(), bytes));
        Ok(format!("memory://{name}"))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
