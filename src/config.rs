use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::RetryLimits;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub pipeline: PipelineRuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the chat-completions endpoint serving both stage models.
    pub endpoint: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Model name submitted per stage. Stage-specific routes win over the
/// default; with neither set the stage falls back to its built-in
/// `hf/<stage>` name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StageRoutesConfig {
    #[serde(default)]
    pub thalamus: Option<String>,
    #[serde(default)]
    pub acc: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineRuntimeConfig {
    #[serde(default)]
    pub limits: RetryLimits,
    #[serde(default)]
    pub routes: StageRoutesConfig,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("albert.sock")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

fn default_enabled_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config: Config = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        if !config.server.socket_path.is_absolute() {
            config.server.socket_path = config_base.join(&config.server.socket_path);
        }
        if !config.logging.dir.is_absolute() {
            config.logging.dir = config_base.join(&config.logging.dir);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: Config = json5::from_str(
            r#"{
                gateway: { endpoint: "http://localhost:8000" },
            }"#,
        )
        .expect("minimal config should parse");

        assert_eq!(config.gateway.endpoint, "http://localhost:8000");
        assert_eq!(config.gateway.request_timeout_ms, 60_000);
        assert_eq!(config.pipeline.limits.max_attempts, 5);
        assert!(config.pipeline.routes.thalamus.is_none());
        assert!(config.logging.stderr_warn_enabled);
    }

    #[test]
    fn stage_routes_are_configurable() {
        let config: Config = json5::from_str(
            r#"{
                gateway: { endpoint: "http://localhost:8000" },
                pipeline: {
                    limits: { max_attempts: 3, attempt_timeout_ms: 5000 },
                    routes: { thalamus: "hf/thalamus-v2", default: "hf/base" },
                },
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.pipeline.limits.max_attempts, 3);
        assert_eq!(
            config.pipeline.routes.thalamus.as_deref(),
            Some("hf/thalamus-v2")
        );
        assert_eq!(config.pipeline.routes.default.as_deref(), Some("hf/base"));
    }
}
