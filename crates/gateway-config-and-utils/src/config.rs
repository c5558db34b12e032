//! Configuration management for the gateway.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Runner base URL used when neither the config file nor the environment set one.
/// Can be overridden at compile time via PARITY_DEFAULT_RUNNER_URL.
pub const DEFAULT_RUNNER_URL: &str = match option_env!("PARITY_DEFAULT_RUNNER_URL") {
    Some(url) => url,
    None => "http://localhost:8080",
};

pub const DEFAULT_LOG_LEVEL: &str = "info";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_API_PREFIX: &str = "api";
const DEFAULT_MAX_TASK_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Main gateway configuration, stored as `config.json` under the base dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub docker: DockerConfig,
}

/// Local listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path segment stripped from inbound paths before dispatch (`/api/tasks` -> `tasks`).
    pub api_prefix: String,
    /// Upper bound on a buffered task-creation body.
    pub max_task_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Base URL of the remote task runner.
    pub server_url: String,
}

/// Per-operation timeouts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub proxy_secs: u64,
    pub upload_secs: u64,
    pub health_secs: u64,
    pub image_pull_secs: u64,
    pub image_save_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Explicit docker binary. When unset, `DOCKER_PATH` and well-known
    /// install locations are searched.
    pub executable: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            max_task_body_bytes: DEFAULT_MAX_TASK_BODY_BYTES,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_RUNNER_URL.to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            proxy_secs: 300,
            upload_secs: 1800,
            health_secs: 5,
            image_pull_secs: 600,
            image_save_secs: 600,
        }
    }
}

impl TimeoutConfig {
    pub fn proxy(&self) -> Duration {
        Duration::from_secs(self.proxy_secs)
    }

    pub fn upload(&self) -> Duration {
        Duration::from_secs(self.upload_secs)
    }

    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            runner: RunnerConfig::default(),
            timeouts: TimeoutConfig::default(),
            docker: DockerConfig::default(),
        }
    }
}

impl Config {
    /// Load `config.json` from the base dir (defaults when absent), then
    /// apply `PARITY_*` environment overrides and validate.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Recognized: `PARITY_LOG_LEVEL`, `PARITY_RUNNER_URL`,
    /// `PARITY_SERVER_HOST`, `PARITY_SERVER_PORT`. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(level) = get("PARITY_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = get("PARITY_RUNNER_URL") {
            self.runner.server_url = url;
        }
        if let Some(host) = get("PARITY_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PARITY_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| {
                CoreError::Config(format!("PARITY_SERVER_PORT is not a valid port: {port}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> CoreResult<()> {
        let url = self.runner_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "runner URL must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.server.max_task_body_bytes == 0 {
            return Err(CoreError::Config(
                "server.max_task_body_bytes must be greater than zero".to_string(),
            ));
        }
        let timeouts = [
            ("proxy_secs", self.timeouts.proxy_secs),
            ("upload_secs", self.timeouts.upload_secs),
            ("health_secs", self.timeouts.health_secs),
            ("image_pull_secs", self.timeouts.image_pull_secs),
            ("image_save_secs", self.timeouts.image_save_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(CoreError::Config(format!(
                "timeouts.{name} must be greater than zero"
            )));
        }
        Ok(())
    }

    pub fn runner_url(&self) -> CoreResult<Url> {
        Url::parse(&self.runner.server_url).map_err(CoreError::from)
    }

    /// `host:port` for the local listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// API prefix without surrounding slashes.
    pub fn api_prefix(&self) -> &str {
        self.server.api_prefix.trim_matches('/')
    }
}
