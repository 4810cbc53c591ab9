//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;

pub(super) const APP_NAME: &str = "discordaio";
pub(super) const APP_QUALIFIER: &str = "com";
pub(super) const APP_ORGANIZATION: &str = "ryozuki";

/// Base URL of the versioned REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v6";
/// Repository advertised in the `User-Agent` header.
pub const USER_AGENT_URL: &str = "https://github.com/Ryozuki/discord.aio";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Caller-side reconnect policy applied by the bot facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Reconnect after transient disconnects instead of returning from `start`.
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,

    /// Consecutive failed attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            max_attempts: default_max_attempts(),
        }
    }
}

/// Library configuration.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path. Logs go to stderr when unset.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_gateway_version")]
    pub gateway_version: u8,

    /// Request `compress=zlib-stream` on the gateway connection.
    #[serde(default)]
    pub transport_compression: bool,

    /// Member count above which offline members are not sent in `GUILD_CREATE`.
    #[serde(default = "default_large_threshold")]
    pub large_threshold: u32,

    /// Upper bound on concurrently running event handlers.
    #[serde(default = "default_max_concurrent_handlers")]
    pub max_concurrent_handlers: usize,

    /// How long `stop` waits for in-flight handlers.
    #[serde(default = "default_handler_drain_timeout_secs")]
    pub handler_drain_timeout_secs: u64,

    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl ClientConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if args.no_reconnect {
            self.reconnect.auto_reconnect = false;
        }
        if args.compress {
            self.transport_compression = true;
        }
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn handler_drain_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_drain_timeout_secs)
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            gateway_version: default_gateway_version(),
            transport_compression: false,
            large_threshold: default_large_threshold(),
            max_concurrent_handlers: default_max_concurrent_handlers(),
            handler_drain_timeout_secs: default_handler_drain_timeout_secs(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("DiscordBot ({USER_AGENT_URL}, {})", env!("CARGO_PKG_VERSION"))
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_gateway_version() -> u8 {
    6
}

const fn default_large_threshold() -> u32 {
    250
}

const fn default_max_concurrent_handlers() -> usize {
    64
}

const fn default_handler_drain_timeout_secs() -> u64 {
    5
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: ClientConfig = toml::from_str("").expect("Failed to parse config");

        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.large_threshold, 250);
        assert!(config.reconnect.auto_reconnect);
        assert!(config.user_agent.starts_with("DiscordBot (https://github.com/Ryozuki/discord.aio, "));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"
            transport_compression = true
            max_concurrent_handlers = 8

            [reconnect]
            max_attempts = 3
        "#;

        let config: ClientConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.transport_compression);
        assert_eq!(config.max_concurrent_handlers, 8);
        assert_eq!(config.reconnect.max_attempts, 3);
        assert!(config.reconnect.auto_reconnect);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_merge_with_args() {
        let args = CliArgs::parse_from([
            "discordaio",
            "--token",
            "abc",
            "--log-level",
            "trace",
            "--no-reconnect",
        ]);
        let mut config = ClientConfig::default();
        config.merge_with_args(&args);

        assert_eq!(config.log_level, LogLevel::Trace);
        assert!(!config.reconnect.auto_reconnect);
        assert!(!config.transport_compression);
    }
}
