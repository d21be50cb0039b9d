// tests/api_http.rs
//
// Managed-invocation router exercised directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use serde_json::{json, Value as Json};
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use blog_enricher::api::{self, AppState};
use blog_enricher::fetch::StaticFetcher;
use blog_enricher::sink::MemorySink;
use blog_enricher::Pipeline;

const BODY_LIMIT: usize = 1024 * 1024;
const POSTS_URL: &str = "http://blog.test/wp-json/wp/v2/posts";

fn listing() -> Json {
    json!([{ "id": 5, "featured_media": 0, "_links": { "author": [{ "href": "http://blog.test/users/5" }] } }])
}

fn test_router(fetcher: StaticFetcher, sink: Arc<MemorySink>) -> Router {
    let pipeline = Pipeline::new(Arc::new(fetcher), sink, POSTS_URL, "wordpress-data.json");
    api::router(AppState::new(pipeline))
}

async fn body_json(resp: shuttle_axum::axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_run() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/run")
        .body(Body::empty())
        .expect("build POST /run")
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router(StaticFetcher::new(), Arc::new(MemorySink::new()));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn run_returns_report_and_stores_output() {
    let fetcher = StaticFetcher::new()
        .with(POSTS_URL, listing())
        .with("http://blog.test/users/5", json!({ "name": "Eve" }));
    let sink = Arc::new(MemorySink::new());
    let app = test_router(fetcher, sink.clone());

    let resp = app.oneshot(post_run()).await.expect("oneshot /run");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    assert_eq!(v["posts"], 1);
    assert_eq!(v["media_fetches"], 0);
    assert_eq!(v["location"], "memory://wordpress-data.json");
    assert!(v.get("finished_at").is_some());

    let out: Json = serde_json::from_slice(&sink.last().unwrap()).unwrap();
    assert_eq!(out, json!([{ "id": 5, "featured_media": 0, "_links": { "author": [{ "href": "http://blog.test/users/5" }] }, "media_details": {}, "author_name": "Eve" }]));
}

#[tokio::test]
async fn failed_run_is_bad_gateway_with_context() {
    let fetcher = StaticFetcher::new()
        .with(POSTS_URL, listing())
        .failing("http://blog.test/users/5", "connection refused");
    let sink = Arc::new(MemorySink::new());
    let app = test_router(fetcher, sink.clone());

    let resp = app.oneshot(post_run()).await.expect("oneshot /run");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let v = body_json(resp).await;
    assert_eq!(v["post_id"], 5);
    assert_eq!(v["url"], "http://blog.test/users/5");
    assert!(v["error"].as_str().unwrap().contains("connection refused"));
    assert!(sink.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn run_is_post_only() {
    let app = test_router(StaticFetcher::new(), Arc::new(MemorySink::new()));
    let req = Request::builder().uri("/run").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_completes_on_a_spawned_multi_thread_task() {
    let fetcher = StaticFetcher::new()
        .with(POSTS_URL, listing())
        .with("http://blog.test/users/5", json!({ "name": "Eve" }))
        .with_delay(std::time::Duration::from_millis(5));
    let sink = Arc::new(MemorySink::new());
    let app = test_router(fetcher, sink.clone());

    let resp = tokio::spawn(app.oneshot(post_run()))
        .await
        .expect("join spawned /run")
        .expect("oneshot /run");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["posts"], 1);
    assert_eq!(sink.calls.lock().unwrap().len(), 1);
}
