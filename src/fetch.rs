// src/fetch.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::PipelineError;

/// One GET, whole body buffered, parsed as JSON. No retries.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, PipelineError>;
    fn name(&self) -> &'static str;
}

/// Accepts only absolute http(s) URLs.
pub fn validate_url(raw: &str) -> Result<Url, PipelineError> {
    let url = Url::parse(raw).map_err(|e| PipelineError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PipelineError::InvalidUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[derive(Clone)]
pub struct HttpJsonFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpJsonFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    async fn get_json(&self, raw: &str) -> Result<Value, PipelineError> {
        let url = validate_url(raw)?;

        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PipelineError::network(raw, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::Network {
                url: raw.to_string(),
                status: Some(status.as_u16()),
                message: format!("unexpected HTTP status {status}"),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| PipelineError::network(raw, format!("reading body: {e}")))?;

        tracing::debug!(url = raw, bytes = body.len(), "fetched");
        serde_json::from_slice(&body).map_err(|e| PipelineError::parse(raw, e))
    }
}

#[async_trait]
impl JsonFetcher for HttpJsonFetcher {
    async fn fetch(&self, raw: &str) -> Result<Value, PipelineError> {
        let t0 = Instant::now();
        let res = self.get_json(raw).await;
        // Every attempt is timed, failed ones included.
        histogram!("enrich_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        res
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Shared counter bookkeeping for the enrichers.
pub(crate) fn record_fetch(relation: &'static str, ok: bool) {
    counter!("enrich_fetch_total", "relation" => relation).increment(1);
    if !ok {
        counter!("enrich_fetch_errors_total", "relation" => relation).increment(1);
    }
}

// --- Test helper ---
/// Serves canned JSON by exact URL and records every request.
/// Unknown URLs fail with a 404 `Network` error.
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Value>,
    failures: HashMap<String, String>,
    delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: Value) -> Self {
        self.responses.insert(url.into(), body);
        self
    }

    /// Make `url` fail with a transport error.
    pub fn failing(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(url.into(), message.into());
        self
    }

    /// Sleep before answering, so fetches overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| *u == url).count()
    }

    /// Most fetches that were ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JsonFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, PipelineError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(msg) = self.failures.get(url) {
            return Err(PipelineError::network(url, msg));
        }
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| PipelineError::Network {
                url: url.to_string(),
                status: Some(404),
                message: "unexpected HTTP status 404 Not Found".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
