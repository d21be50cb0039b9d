// tests/local_sink.rs
use blog_enricher::sink::{LocalFileSink, OutputSink};
use blog_enricher::PipelineError;

#[tokio::test]
async fn creates_missing_directory_and_writes_file() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("nested").join("output");
    let sink = LocalFileSink::new(&dir);

    let loc = sink.store("wordpress-data.json", b"[]".to_vec()).await.unwrap();
    assert_eq!(loc, dir.join("wordpress-data.json").display().to_string());
    assert_eq!(std::fs::read(dir.join("wordpress-data.json")).unwrap(), b"[]");
}

#[tokio::test]
async fn overwrites_previous_output() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = LocalFileSink::new(tmp.path());

    sink.store("out.json", b"[1]".to_vec()).await.unwrap();
    sink.store("out.json", b"[2]".to_vec()).await.unwrap();
    assert_eq!(std::fs::read(tmp.path().join("out.json")).unwrap(), b"[2]");
}

#[tokio::test]
async fn unwritable_location_is_sink_error() {
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the directory should be.
    let blocker = tmp.path().join("output");
    std::fs::write(&blocker, b"not a dir").unwrap();
    let sink = LocalFileSink::new(&blocker);

    let err = sink.store("out.json", b"[]".to_vec()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Sink { .. }), "{err:?}");
}
