/*
[INPUT]:  Optional YAML file, TRADEDASH_* environment variables
[OUTPUT]: DashboardConfig and the per-component settings derived from it
[POS]:    Configuration layer - client setup
[UPDATE]: When adding new configuration options
*/

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tradedash_gateway::ClientConfig;

use crate::control::ControlSettings;
use crate::demo::DataSource;
use crate::poller::PollerSettings;

pub const ENV_PREFIX: &str = "TRADEDASH";

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub session: SessionSection,
    /// `live` or `demo`
    #[serde(default)]
    pub data_source: DataSource,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Backend endpoints and per-class deadlines
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GatewaySection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Wallet connect route; some deployments expose `/binance/connect`
    #[serde(default = "default_connect_path")]
    pub connect_path: String,
    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,
    #[serde(default = "default_control_timeout")]
    pub control_timeout_secs: u64,
    #[serde(default = "default_data_timeout")]
    pub data_timeout_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: default_ws_url(),
            connect_path: default_connect_path(),
            status_timeout_secs: default_status_timeout(),
            control_timeout_secs: default_control_timeout(),
            data_timeout_secs: default_data_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PollingSection {
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,
    #[serde(default = "default_portfolio_interval")]
    pub portfolio_interval_secs: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_confirm_attempts")]
    pub confirm_attempts: u32,
    #[serde(default = "default_confirm_delay")]
    pub confirm_delay_ms: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            status_interval_secs: default_status_interval(),
            portfolio_interval_secs: default_portfolio_interval(),
            failure_threshold: default_failure_threshold(),
            confirm_attempts: default_confirm_attempts(),
            confirm_delay_ms: default_confirm_delay(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SessionSection {
    /// Session file; defaults to the platform data dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingSection {
    /// EnvFilter directive, e.g. `info` or `tradedash_session=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Daily-rolling log files go here when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:5000".to_string()
}

fn default_connect_path() -> String {
    "/wallet/connect".to_string()
}

fn default_status_timeout() -> u64 {
    5
}

fn default_control_timeout() -> u64 {
    15
}

fn default_data_timeout() -> u64 {
    10
}

fn default_status_interval() -> u64 {
    5
}

fn default_portfolio_interval() -> u64 {
    60
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_confirm_attempts() -> u32 {
    3
}

fn default_confirm_delay() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DashboardConfig {
    /// Layer defaults, an optional YAML file, then `TRADEDASH_*` variables
    /// (`TRADEDASH_GATEWAY__BASE_URL`, `TRADEDASH_DATA_SOURCE`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("logging.level", default_log_level())?
            .set_default("data_source", "live")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse a YAML document directly
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if url::Url::parse(&self.gateway.base_url).is_err() {
            errors.push(format!("gateway.base_url is not a valid URL: {}", self.gateway.base_url));
        }
        match url::Url::parse(&self.gateway.ws_url) {
            Ok(ws_url) if matches!(ws_url.scheme(), "ws" | "wss") => {}
            Ok(_) => errors.push(format!(
                "gateway.ws_url must use ws:// or wss://: {}",
                self.gateway.ws_url
            )),
            Err(_) => {
                errors.push(format!("gateway.ws_url is not a valid URL: {}", self.gateway.ws_url))
            }
        }
        if !self.gateway.connect_path.starts_with('/') {
            errors.push("gateway.connect_path must start with '/'".to_string());
        }
        for (name, value) in [
            ("gateway.status_timeout_secs", self.gateway.status_timeout_secs),
            ("gateway.control_timeout_secs", self.gateway.control_timeout_secs),
            ("gateway.data_timeout_secs", self.gateway.data_timeout_secs),
            ("polling.status_interval_secs", self.polling.status_interval_secs),
            ("polling.portfolio_interval_secs", self.polling.portfolio_interval_secs),
        ] {
            if value == 0 {
                errors.push(format!("{name} must be greater than zero"));
            }
        }
        if self.polling.failure_threshold == 0 {
            errors.push("polling.failure_threshold must be at least 1".to_string());
        }
        if self.polling.confirm_attempts == 0 {
            errors.push("polling.confirm_attempts must be at least 1".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.gateway.base_url.clone(),
            ws_url: self.gateway.ws_url.clone(),
            connect_path: self.gateway.connect_path.clone(),
            status_timeout: Duration::from_secs(self.gateway.status_timeout_secs),
            control_timeout: Duration::from_secs(self.gateway.control_timeout_secs),
            data_timeout: Duration::from_secs(self.gateway.data_timeout_secs),
            ..ClientConfig::default()
        }
    }

    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            status_timeout: Duration::from_secs(self.gateway.status_timeout_secs),
            control_timeout: Duration::from_secs(self.gateway.control_timeout_secs),
            confirm_attempts: self.polling.confirm_attempts,
            confirm_delay: Duration::from_millis(self.polling.confirm_delay_ms),
            failure_threshold: self.polling.failure_threshold,
        }
    }

    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            interval: Duration::from_secs(self.polling.status_interval_secs),
            status_timeout: Duration::from_secs(self.gateway.status_timeout_secs),
            failure_threshold: self.polling.failure_threshold,
        }
    }

    pub fn portfolio_interval(&self) -> Duration {
        Duration::from_secs(self.polling.portfolio_interval_secs)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.data_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = DashboardConfig::from_yaml("{}").unwrap();

        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.polling.status_interval_secs, 5);
        assert_eq!(config.polling.portfolio_interval_secs, 60);
        assert_eq!(config.data_source, DataSource::Live);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let config = DashboardConfig::from_yaml(
            r#"
gateway:
  base_url: "http://10.0.0.5:8080"
  connect_path: "/binance/connect"
polling:
  failure_threshold: 5
data_source: demo
"#,
        )
        .unwrap();

        assert_eq!(config.gateway.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.gateway.connect_path, "/binance/connect");
        assert_eq!(config.gateway.control_timeout_secs, 15);
        assert_eq!(config.polling.failure_threshold, 5);
        assert_eq!(config.data_source, DataSource::Demo);
    }

    #[test]
    fn load_reads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "logging:\n  level: debug").unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.gateway.base_url, "http://localhost:5000");
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut config = DashboardConfig::default();
        config.gateway.base_url = "not a url".to_string();
        config.gateway.connect_path = "wallet/connect".to_string();
        config.polling.status_interval_secs = 0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn validate_rejects_bad_ws_url() {
        let mut config = DashboardConfig::default();
        config.gateway.ws_url = "not a url".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("gateway.ws_url is not a valid URL"));

        config.gateway.ws_url = "http://localhost:5000".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors, vec!["gateway.ws_url must use ws:// or wss://: http://localhost:5000"]);

        config.gateway.ws_url = "wss://bot.example.com".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn derived_settings_carry_timeouts() {
        let config = DashboardConfig::default();

        assert_eq!(config.client_config().control_timeout, Duration::from_secs(15));
        assert_eq!(config.control_settings().confirm_delay, Duration::from_millis(1000));
        assert_eq!(config.poller_settings().interval, Duration::from_secs(5));
    }
}
