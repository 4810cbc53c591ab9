use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "discordaio",
    version,
    about = "Ping bot built on the discordaio gateway client",
    long_about = None
)]
pub struct CliArgs {
    /// Bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Exit instead of reconnecting when the gateway connection drops.
    #[arg(long)]
    pub no_reconnect: bool,

    /// Request zlib-stream transport compression.
    #[arg(long)]
    pub compress: bool,
}
