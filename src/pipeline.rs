// src/pipeline.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::config::Config;
use crate::enrich::{aggregate, enrich_authors, enrich_media, list_posts, FetchLimit};
use crate::error::PipelineError;
use crate::fetch::{HttpJsonFetcher, JsonFetcher};
use crate::format::format_records;
use crate::sink::{select_sink, OutputSink};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("enrich_runs_total", "Pipeline runs started.");
        describe_counter!("enrich_run_failures_total", "Pipeline runs that failed.");
        describe_counter!(
            "enrich_fetch_total",
            "Per-post dependent fetches, by relation."
        );
        describe_counter!(
            "enrich_fetch_errors_total",
            "Per-post dependent fetches that failed, by relation."
        );
        describe_histogram!("enrich_fetch_ms", "HTTP fetch time in milliseconds.");
        describe_gauge!(
            "enrich_last_run_ts",
            "Unix ts when the pipeline last finished successfully."
        );
    });
}

/// What a finished run produced.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunReport {
    pub posts: usize,
    pub media_fetches: usize,
    pub author_fetches: usize,
    pub bytes: usize,
    pub location: String,
    pub finished_at: DateTime<Utc>,
}

/// List → enrich (media ‖ authors) → join → format → sink.
pub struct Pipeline {
    fetcher: Arc<dyn JsonFetcher>,
    sink: Arc<dyn OutputSink>,
    posts_url: String,
    output_name: String,
    max_in_flight: usize,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn JsonFetcher>,
        sink: Arc<dyn OutputSink>,
        posts_url: impl Into<String>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            posts_url: posts_url.into(),
            output_name: output_name.into(),
            max_in_flight: 8,
        }
    }

    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n.max(1);
        self
    }

    /// Wire the HTTP fetcher and the configured sink.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("blog-enricher/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("building http client")?;
        let fetcher =
            HttpJsonFetcher::new(client.clone()).with_timeout(cfg.request_timeout_secs);
        let sink = select_sink(cfg, client)?;
        Ok(Self::new(
            Arc::new(fetcher),
            sink,
            cfg.posts_url.clone(),
            cfg.output_name.clone(),
        )
        .with_max_in_flight(cfg.max_concurrent_fetches))
    }

    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        ensure_metrics_described();
        counter!("enrich_runs_total").increment(1);

        let res = self.run_inner().await;
        match &res {
            Ok(report) => {
                gauge!("enrich_last_run_ts").set(report.finished_at.timestamp() as f64);
                tracing::info!(
                    posts = report.posts,
                    bytes = report.bytes,
                    location = %report.location,
                    "pipeline run finished"
                );
            }
            Err(e) => {
                counter!("enrich_run_failures_total").increment(1);
                tracing::error!(
                    error = %e,
                    post_id = ?e.post_id(),
                    url = ?e.url(),
                    "pipeline run failed"
                );
            }
        }
        res
    }

    async fn run_inner(&self) -> Result<RunReport, PipelineError> {
        let fetcher = self.fetcher.as_ref();

        // Listed once; both enrichers and the join see this exact snapshot.
        let posts = list_posts(fetcher, &self.posts_url).await?;
        let media_fetches = posts.iter().filter(|p| p.has_featured_media).count();
        let author_fetches = posts.len();

        // One cap for both enrichers together.
        let limit = FetchLimit::new(self.max_in_flight);
        let (media, authors) = tokio::try_join!(
            enrich_media(fetcher, &posts, &limit),
            enrich_authors(fetcher, &posts, &limit),
        )?;

        let joined = aggregate(posts, media, authors)?;
        let bytes = format_records(&joined)?;
        let len = bytes.len();
        let location = self.sink.store(&self.output_name, bytes).await?;

        Ok(RunReport {
            posts: joined.len(),
            media_fetches,
            author_fetches,
            bytes: len,
            location,
            finished_at: Utc::now(),
        })
    }
}
