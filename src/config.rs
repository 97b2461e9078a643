use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE, DEFAULT_HTTP_TIMEOUT_SECONDS,
    DEFAULT_POLL_BACKOFF_FACTOR, DEFAULT_POLL_INTERVAL_SECONDS, DEFAULT_POLL_MAX_INTERVAL_SECONDS,
    DEFAULT_STORE_DIR, DEFAULT_TARGET_TIMEOUT_SECONDS, DEFAULT_TASK_TIMEOUT_SECONDS,
    MAX_POLL_INTERVAL_SECONDS, OCP_PASSWORD_ENV, OCP_URL_ENV, OCP_USER_ENV,
};
use crate::ocp::task::PollPolicy;
use crate::ocp::{Credentials, Target};

pub fn resolve_config_path(path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = path {
        return path;
    }
    if let Some(path) = env_optional(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR)
}

fn default_http_timeout_seconds() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_target_timeout_seconds() -> u64 {
    DEFAULT_TARGET_TIMEOUT_SECONDS
}

fn default_poll_interval_seconds() -> u64 {
    DEFAULT_POLL_INTERVAL_SECONDS
}

fn default_poll_max_interval_seconds() -> u64 {
    DEFAULT_POLL_MAX_INTERVAL_SECONDS
}

fn default_poll_backoff_factor() -> f64 {
    DEFAULT_POLL_BACKOFF_FACTOR
}

fn default_task_timeout_seconds() -> u64 {
    DEFAULT_TASK_TIMEOUT_SECONDS
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatherConfig {
    #[serde(default)]
    pub ocp: OcpLogin,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_target_timeout_seconds")]
    pub target_timeout_seconds: u64,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcpLogin {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

/// One cluster to gather from. Login fields left out inherit from `ocp`.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub cluster_name: String,
    pub cluster_id: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_poll_max_interval_seconds")]
    pub max_interval_seconds: u64,
    #[serde(default = "default_poll_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_task_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval_seconds(),
            max_interval_seconds: default_poll_max_interval_seconds(),
            backoff_factor: default_poll_backoff_factor(),
            timeout_seconds: default_task_timeout_seconds(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<GatherConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Invalid config {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<GatherConfig> {
    let config: GatherConfig =
        serde_json::from_str(contents).context("failed to parse config JSON")?;
    Ok(config)
}

impl GatherConfig {
    /// Replace the shared login with values from `lookup` (the process
    /// environment outside of tests).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(OCP_URL_ENV) {
            self.ocp.url = url;
        }
        if let Some(user) = lookup(OCP_USER_ENV) {
            self.ocp.user = user;
        }
        if let Some(password) = lookup(OCP_PASSWORD_ENV) {
            self.ocp.password = password;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            bail!("config must list at least one target");
        }
        let mut seen = BTreeSet::new();
        for target in &self.targets {
            if target.cluster_name.trim().is_empty() {
                bail!("target cluster_name must not be empty");
            }
            if !seen.insert(target.cluster_name.as_str()) {
                bail!("duplicate target cluster_name {}", target.cluster_name);
            }
        }
        if self.http_timeout_seconds == 0 {
            bail!("http_timeout_seconds must be greater than 0");
        }
        if self.target_timeout_seconds == 0 {
            bail!("target_timeout_seconds must be greater than 0");
        }
        if self.polling.interval_seconds == 0 {
            bail!("polling.interval_seconds must be greater than 0");
        }
        if self.polling.max_interval_seconds > MAX_POLL_INTERVAL_SECONDS {
            bail!("polling.max_interval_seconds must not exceed {MAX_POLL_INTERVAL_SECONDS}");
        }
        if self.polling.max_interval_seconds < self.polling.interval_seconds {
            bail!("polling.max_interval_seconds must not be below polling.interval_seconds");
        }
        if !self.polling.backoff_factor.is_finite() || self.polling.backoff_factor < 1.0 {
            bail!("polling.backoff_factor must be a finite number >= 1.0");
        }
        if self.polling.timeout_seconds == 0 {
            bail!("polling.timeout_seconds must be greater than 0");
        }
        Ok(())
    }

    /// Resolve the configured targets, keeping only `only` when it is non-empty.
    pub fn resolve_targets(&self, only: &[String]) -> Result<Vec<Target>> {
        for name in only {
            if !self.targets.iter().any(|t| &t.cluster_name == name) {
                bail!("cluster {name} is not listed in the config targets");
            }
        }
        self.targets
            .iter()
            .filter(|t| only.is_empty() || only.contains(&t.cluster_name))
            .map(|t| self.resolve_target(t))
            .collect()
    }

    fn resolve_target(&self, target: &TargetConfig) -> Result<Target> {
        let url = target.url.as_deref().unwrap_or(&self.ocp.url).trim();
        let user = target.user.as_deref().unwrap_or(&self.ocp.user).trim();
        let password = target.password.as_deref().unwrap_or(&self.ocp.password);
        if url.is_empty() {
            bail!("no control plane url for cluster {}", target.cluster_name);
        }
        let parsed = Url::parse(url)
            .with_context(|| format!("invalid control plane url for cluster {}", target.cluster_name))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            bail!(
                "control plane url for cluster {} must be http or https",
                target.cluster_name
            );
        }
        if user.is_empty() {
            bail!("no control plane user for cluster {}", target.cluster_name);
        }
        Ok(Target {
            cluster_name: target.cluster_name.clone(),
            cluster_id: target.cluster_id,
            base_url: url.trim_end_matches('/').to_string(),
            credentials: Credentials {
                user: user.to_string(),
                password: password.to_string(),
            },
        })
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.polling.interval_seconds),
            max_interval: Duration::from_secs(self.polling.max_interval_seconds),
            backoff_factor: self.polling.backoff_factor,
            timeout: Duration::from_secs(self.polling.timeout_seconds),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn target_timeout(&self) -> Duration {
        Duration::from_secs(self.target_timeout_seconds)
    }
}

pub fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
