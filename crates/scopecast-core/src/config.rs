use crate::error::Result;
use crate::ingest::UnmatchedRolePolicy;
use crate::paths;
use crate::request::DEFAULT_MIN_DESCRIPTION_CHARS;
use crate::roles::Roster;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the generation API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the API key. The key itself is never
    /// stored in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl AiConfig {
    /// The API key from the configured environment variable, if set and
    /// non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// EstimateConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_min_description_chars")]
    pub min_description_chars: usize,
    #[serde(default)]
    pub unmatched_roles: UnmatchedRolePolicy,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_min_description_chars() -> usize {
    DEFAULT_MIN_DESCRIPTION_CHARS
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            min_description_chars: default_min_description_chars(),
            unmatched_roles: UnmatchedRolePolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub roles: Roster,
    #[serde(default)]
    pub estimate: EstimateConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            ai: AiConfig::default(),
            roles: Roster::default(),
            estimate: EstimateConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Resolve the config path: explicit argument first, then
    /// `~/.scopecast/config.yaml`.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(p) => Ok(p.to_path_buf()),
            None => paths::default_config_path(),
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. The roster must not be empty
        if self.roles.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "roles is empty: estimates cannot be priced".to_string(),
            });
        }

        // 2. Two roster names normalizing to the same key would share a rate
        for name in self.roles.duplicate_names() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("role '{name}' duplicates an earlier role after normalization"),
            });
        }

        // 3. Default rates must be usable form values
        for role in self.roles.roles() {
            if let Some(rate) = role.default_rate {
                if !rate.is_finite() || rate <= 0.0 {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "role '{}' has default_rate={} (must be > 0)",
                            role.name, rate
                        ),
                    });
                }
            }
        }

        if self.estimate.min_description_chars == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "estimate.min_description_chars is 0: empty descriptions will be sent"
                    .to_string(),
            });
        }

        if self.ai.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "ai.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.ai.api_key().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "environment variable '{}' is not set: analysis will fail",
                    self.ai.api_key_env
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
