use std::sync::Arc;
use std::{env, fs, path::PathBuf, time::Duration};

use anyhow::Result;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::aggregate::MissingKeyPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub es_url: Arc<str>,
    pub es_user: Arc<str>,
    pub es_pass: Arc<str>,
    pub es_index: Arc<str>,
    pub http_timeout_secs: u64,
    pub search_size: usize,
    pub api_search_size: usize,
    pub missing_key_policy: MissingKeyPolicy,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_es_url")]
    es_url: String,
    #[serde(default = "default_es_user")]
    es_user: String,
    #[serde(default = "default_es_pass")]
    es_pass: String,
    #[serde(default)]
    es_index: String,
    #[serde(default = "default_http_timeout_secs")]
    http_timeout_secs: u64,
    #[serde(default = "default_search_size")]
    search_size: usize,
    #[serde(default = "default_api_search_size")]
    api_search_size: usize,
    #[serde(default)]
    missing_key_policy: MissingKeyPolicy,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            es_url: raw.es_url.into(),
            es_user: raw.es_user.into(),
            es_pass: raw.es_pass.into(),
            es_index: raw.es_index.into(),
            http_timeout_secs: raw.http_timeout_secs,
            search_size: raw.search_size,
            api_search_size: raw.api_search_size,
            missing_key_policy: raw.missing_key_policy,
        }
    }
}

impl Config {
    /// Load from an explicit TOML path, the default config path, or pure
    /// environment, in that order; environment variables override file
    /// values either way.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut cfg = if let Some(path) = path {
            let raw = fs::read_to_string(path)?;
            Config::from(toml::from_str::<RawConfig>(&raw)?)
        } else {
            let default_path = default_config_path();
            if default_path.exists() {
                let raw = fs::read_to_string(&default_path)?;
                Config::from(toml::from_str::<RawConfig>(&raw)?)
            } else {
                Self::from_env()
            }
        };

        if let Ok(v) = env::var("ES_HOST") {
            cfg.es_url = v.into();
        }
        if let Ok(v) = env::var("ES_USER") {
            cfg.es_user = v.into();
        }
        if let Ok(v) = env::var("ES_PASS") {
            cfg.es_pass = v.into();
        }
        if let Ok(v) = env::var("ES_INDEX") {
            cfg.es_index = v.into();
        }
        maybe_env_u64(&mut cfg.http_timeout_secs, "HTTP_TIMEOUT_SECS");
        maybe_env_usize(&mut cfg.search_size, "SEARCH_SIZE");
        maybe_env_usize(&mut cfg.api_search_size, "API_SEARCH_SIZE");
        if let Ok(v) = env::var("MISSING_KEY_POLICY") {
            if let Some(policy) = MissingKeyPolicy::parse(&v) {
                cfg.missing_key_policy = policy;
            }
        }

        validate_required(&cfg)?;
        Ok(cfg)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    fn from_env() -> Self {
        Self {
            es_url: env_or("ES_HOST", default_es_url).into(),
            es_user: env_or("ES_USER", default_es_user).into(),
            es_pass: env_or("ES_PASS", default_es_pass).into(),
            es_index: env::var("ES_INDEX").unwrap_or_default().into(),
            http_timeout_secs: default_http_timeout_secs(),
            search_size: default_search_size(),
            api_search_size: default_api_search_size(),
            missing_key_policy: MissingKeyPolicy::default(),
        }
    }
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("com", "eventscope", "eventscope")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(".eventscope/config.toml"))
}

fn validate_required(cfg: &Config) -> Result<()> {
    if cfg.es_index.trim().is_empty() {
        anyhow::bail!("ES_INDEX is required (set via env or config)");
    }
    if cfg.es_url.trim().is_empty() {
        anyhow::bail!("ES_HOST is required (set via env or config)");
    }
    Ok(())
}

fn env_or(key: &str, default: fn() -> String) -> String {
    env::var(key).unwrap_or_else(|_| default())
}

fn maybe_env_usize(val: &mut usize, key: &str) {
    if let Ok(v) = env::var(key) {
        if let Ok(n) = v.parse::<usize>() {
            *val = n;
        }
    }
}

fn maybe_env_u64(val: &mut u64, key: &str) {
    if let Ok(v) = env::var(key) {
        if let Ok(n) = v.parse::<u64>() {
            *val = n;
        }
    }
}

fn default_es_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_es_user() -> String {
    "elastic".to_string()
}

fn default_es_pass() -> String {
    "changeme".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_search_size() -> usize {
    1000
}

fn default_api_search_size() -> usize {
    10_000
}
