//! Infrastructure layer with external service adapters.

/// Client configuration.
pub mod config;
/// Discord REST and gateway clients.
pub mod discord;

pub use config::{CliArgs, ClientConfig, ConfigError, LogLevel, ReconnectConfig, StorageManager};
pub use discord::{
    DiscordClient, DispatchEvent, GatewayClient, GatewayClientConfig, HttpClient, ReqwestBackend,
};
