use std::sync::Arc;

use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::Mutex;

use crate::pipeline::{Pipeline, RunReport};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    // Held for the duration of a run; a second trigger gets 409.
    running: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            running: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/run", post(run))
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
    post_id: Option<u64>,
    url: Option<String>,
}

async fn run(State(state): State<AppState>) -> Response {
    let Ok(_guard) = state.running.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(ErrorBody {
                error: "a run is already in progress".to_string(),
                post_id: None,
                url: None,
            }),
        )
            .into_response();
    };

    match state.pipeline.run().await {
        Ok(report) => (StatusCode::OK, Json::<RunReport>(report)).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                error: e.to_string(),
                post_id: e.post_id(),
                url: e.url().map(str::to_string),
            }),
        )
            .into_response(),
    }
}
