//! One-shot run: list, enrich, join, write. Exits non-zero on any failure.
//!
//! Writes `./output/wordpress-data.json` by default; `ENRICH_SINK=object-store`
//! or `APP_ENV=production` uploads instead.

use anyhow::Context;
use blog_enricher::{Config, Pipeline, SinkMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    blog_enricher::init_tracing();

    let cfg = Config::load(SinkMode::Local).context("loading config")?;
    let pipeline = Pipeline::from_config(&cfg)?;

    let report = pipeline
        .run()
        .await
        .with_context(|| format!("enriching posts from {}", cfg.posts_url))?;

    println!(
        "Successfully output {} posts ({} bytes) to {}",
        report.posts, report.bytes, report.location
    );
    Ok(())
}
