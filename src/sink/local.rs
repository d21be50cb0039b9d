// src/sink/local.rs
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::sink::OutputSink;

/// Writes `<dir>/<name>`, creating `dir` if needed.
///
/// Bytes go to a hidden temp file first and are renamed into place, so readers
/// never see a half-written document and a failed run leaves no output file.
pub struct LocalFileSink {
    dir: PathBuf,
}

impl LocalFileSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl OutputSink for LocalFileSink {
    async fn store(&self, name: &str, bytes: Vec<u8>) -> Result<String, PipelineError> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        let shown = target.display().to_string();

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PipelineError::sink(self.dir.display().to_string(), e))?;

        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PipelineError::sink(&shown, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PipelineError::sink(&shown, e));
        }

        tracing::info!(path = %shown, bytes = bytes.len(), "wrote output file");
        Ok(shown)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
