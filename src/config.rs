// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "ENRICH_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/enrich.toml";

/// Where the finished document goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkMode {
    Local,
    ObjectStore,
}

impl SinkMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "file" => Ok(SinkMode::Local),
            "object-store" | "object_store" | "s3" => Ok(SinkMode::ObjectStore),
            other => bail!("unknown sink mode {other:?} (expected `local` or `object-store`)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub posts_url: String,
    pub output_name: String,
    pub output_dir: PathBuf,
    pub bucket: String,
    pub key_prefix: String,
    /// Required in object-store mode; no public default accepts unsigned writes.
    pub object_store_endpoint: Option<String>,
    pub sink_mode: SinkMode,
    pub max_concurrent_fetches: usize,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn defaults(sink_mode: SinkMode) -> Self {
        Self {
            posts_url: "http://blog.pvdgeeks.org/wp-json/wp/v2/posts".to_string(),
            output_name: "wordpress-data.json".to_string(),
            output_dir: PathBuf::from("./output"),
            bucket: "data.pvdgeeks.org".to_string(),
            key_prefix: "wordpress".to_string(),
            object_store_endpoint: None,
            sink_mode,
            max_concurrent_fetches: 8,
            request_timeout_secs: 10,
        }
    }

    /// Defaults, then the optional TOML file, then environment overrides.
    ///
    /// `default_sink` is the entrypoint's choice when neither `ENRICH_SINK`
    /// nor `APP_ENV=production` says otherwise.
    pub fn load(default_sink: SinkMode) -> Result<Self> {
        let mut cfg = Self::defaults(default_sink);
        if let Some(path) = config_file_path()? {
            let file = FileConfig::load(&path)?;
            file.apply(&mut cfg);
        }
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Apply `ENRICH_*` / `APP_ENV` overrides read through `get`.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = get("ENRICH_POSTS_URL") {
            self.posts_url = v;
        }
        if let Some(v) = get("ENRICH_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("ENRICH_OUTPUT_NAME") {
            self.output_name = v;
        }
        if let Some(v) = get("ENRICH_BUCKET") {
            self.bucket = v;
        }
        if let Some(v) = get("ENRICH_KEY_PREFIX") {
            self.key_prefix = v;
        }
        if let Some(v) = get("ENRICH_OBJECT_STORE_ENDPOINT") {
            self.object_store_endpoint = Some(v);
        }
        if let Some(v) = get("ENRICH_MAX_CONCURRENT_FETCHES") {
            self.max_concurrent_fetches = v
                .trim()
                .parse()
                .with_context(|| format!("ENRICH_MAX_CONCURRENT_FETCHES={v:?}"))?;
        }
        if let Some(v) = get("ENRICH_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("ENRICH_REQUEST_TIMEOUT_SECS={v:?}"))?;
        }

        match get("ENRICH_SINK") {
            Some(v) => self.sink_mode = SinkMode::parse(&v)?,
            None => {
                if get("APP_ENV").is_some_and(|e| e.eq_ignore_ascii_case("production")) {
                    self.sink_mode = SinkMode::ObjectStore;
                }
            }
        }

        self.validate()
    }

    fn validate(&mut self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            self.max_concurrent_fetches = 1;
        }
        if self.request_timeout_secs == 0 {
            bail!("request timeout must be at least 1 second");
        }
        if self.sink_mode == SinkMode::ObjectStore {
            let endpoint = self
                .object_store_endpoint
                .as_deref()
                .filter(|e| !e.trim().is_empty())
                .ok_or_else(|| {
                    anyhow!("object-store sink needs an endpoint (ENRICH_OBJECT_STORE_ENDPOINT)")
                })?;
            crate::fetch::validate_url(endpoint)
                .map_err(|e| anyhow!("object store endpoint: {e}"))?;
        }
        if self.output_name.trim().is_empty() || self.output_name.contains('/') {
            bail!("output name {:?} must be a plain file name", self.output_name);
        }
        crate::fetch::validate_url(&self.posts_url)
            .map_err(|e| anyhow!("posts url: {e}"))?;
        Ok(())
    }
}

/// 1) $ENRICH_CONFIG_PATH (must exist)
/// 2) config/enrich.toml if present
fn config_file_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
        }
        return Ok(Some(pb));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default.exists().then_some(default))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    posts_url: Option<String>,
    output_name: Option<String>,
    output_dir: Option<PathBuf>,
    bucket: Option<String>,
    key_prefix: Option<String>,
    object_store_endpoint: Option<String>,
    sink: Option<SinkMode>,
    max_concurrent_fetches: Option<usize>,
    request_timeout_secs: Option<u64>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    fn apply(self, cfg: &mut Config) {
        if let Some(v) = self.posts_url {
            cfg.posts_url = v;
        }
        if let Some(v) = self.output_name {
            cfg.output_name = v;
        }
        if let Some(v) = self.output_dir {
            cfg.output_dir = v;
        }
        if let Some(v) = self.bucket {
            cfg.bucket = v;
        }
        if let Some(v) = self.key_prefix {
            cfg.key_prefix = v;
        }
        if let Some(v) = self.object_store_endpoint {
            cfg.object_store_endpoint = Some(v);
        }
        if let Some(v) = self.sink {
            cfg.sink_mode = v;
        }
        if let Some(v) = self.max_concurrent_fetches {
            cfg.max_concurrent_fetches = v;
        }
        if let Some(v) = self.request_timeout_secs {
            cfg.request_timeout_secs = v;
        }
    }
}
