use anyhow::Context as _;
use chrono::NaiveDate;
use scopecast_core::config::Config;
use scopecast_core::ingest::{ingest, Ingested};
use scopecast_core::types::EstimateDocument;
use std::path::{Path, PathBuf};

/// Resolved config plus the path it came from.
pub struct Context {
    pub config_path: PathBuf,
    pub config: Config,
}

impl Context {
    /// Resolution order:
    /// 1. `--config` flag / `SCOPECAST_CONFIG` env var (passed in as `explicit`)
    /// 2. `~/.scopecast/config.yaml`
    /// 3. Built-in defaults when the file does not exist
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = Config::resolve_path(explicit)?;
        let config = Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?;
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Read a saved estimate and run it through ingestion with the
    /// configured roster and policy.
    pub fn read_estimate(&self, file: &Path) -> anyhow::Result<Ingested> {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let document = EstimateDocument::from_json(&raw)
            .with_context(|| format!("failed to parse {}", file.display()))?;
        let ingested = ingest(
            document,
            &self.config.roles,
            self.config.estimate.unmatched_roles,
        )?;
        Ok(ingested)
    }
}

/// `--today` when given, the local date otherwise.
pub fn today_or(explicit: Option<NaiveDate>) -> NaiveDate {
    explicit.unwrap_or_else(|| chrono::Local::now().date_naive())
}
