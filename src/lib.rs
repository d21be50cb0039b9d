// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod format;
pub mod metrics;
pub mod pipeline;
pub mod sink;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::{Config, SinkMode};
pub use crate::error::{PipelineError, Relation};
pub use crate::pipeline::{Pipeline, RunReport};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing to stderr. `RUST_LOG` wins over the built-in filter.
/// Safe to call twice; the second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blog_enricher=info,enrich_local=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
