//! Blog Enricher — managed entrypoint.
//! Serves `POST /run` (plus `/health` and `/metrics`) on Shuttle; each call runs
//! the enrichment pipeline once and answers with the run report.
//!
//! For a one-shot local run use the `enrich_local` binary.

use blog_enricher::{api, metrics::Metrics, Config, Pipeline, SinkMode};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Managed runs publish to the object store unless ENRICH_SINK says otherwise.
    let cfg = Config::load(SinkMode::ObjectStore).map_err(shuttle_runtime::Error::Custom)?;
    tracing::info!(
        posts_url = %cfg.posts_url,
        sink = ?cfg.sink_mode,
        max_in_flight = cfg.max_concurrent_fetches,
        "config loaded"
    );

    let pipeline = Pipeline::from_config(&cfg).map_err(shuttle_runtime::Error::Custom)?;
    let metrics = Metrics::init().map_err(shuttle_runtime::Error::Custom)?;

    let router = api::router(api::AppState::new(pipeline)).merge(metrics.router());

    Ok(router.into())
}
