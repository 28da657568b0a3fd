use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::audit::{TrackedMetrics, DEFAULT_TRACKED_METRICS};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_tracked")]
    pub tracked: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub reports_dir: Option<String>,
    pub tracked: Option<Vec<String>>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/perf-baseline/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("failed parsing TOML config: {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(reports_dir) = overrides.reports_dir {
            self.storage.reports_dir = reports_dir;
        }
        if let Some(tracked) = overrides.tracked {
            self.metrics.tracked = tracked;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_reports_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.reports_dir)
    }

    pub fn tracked_metrics(&self) -> TrackedMetrics {
        let metrics = TrackedMetrics::new(self.metrics.tracked.iter().cloned());
        if metrics.is_empty() {
            TrackedMetrics::default()
        } else {
            metrics
        }
    }

    pub fn default_template() -> String {
        let tracked = DEFAULT_TRACKED_METRICS
            .iter()
            .map(|key| format!("    \"{key}\","))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"[storage]
reports_dir = "{reports_dir}"

[metrics]
tracked = [
{tracked}
]

[server]
host = "{host}"
port = {port}
"#,
            reports_dir = default_reports_dir(),
            host = default_host(),
            port = default_port(),
        )
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            tracked: default_tracked(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_reports_dir() -> String {
    "report".to_string()
}

fn default_tracked() -> Vec<String> {
    DEFAULT_TRACKED_METRICS
        .iter()
        .map(|key| key.to_string())
        .collect()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}
