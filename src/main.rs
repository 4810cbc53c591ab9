use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use discordaio::infrastructure::discord::CreateMessageRequest;
use discordaio::infrastructure::{CliArgs, ClientConfig, StorageManager};
use discordaio::{Bot, Event, HandlerError};

fn init_logging(config: &ClientConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }

    Ok(())
}

fn register_handlers(bot: &Bot) -> Result<()> {
    bot.on("on_ready", |_| async {
        info!("Bot is ready");
        Ok(())
    })?;

    let rest = bot.rest().clone();
    bot.on("on_message", move |event| {
        let rest = rest.clone();
        async move {
            let Event::Message(message) = event else {
                return Ok(());
            };
            if message.author.bot || message.content.trim() != "!ping" {
                return Ok(());
            }

            rest.create_message(message.channel_id, &CreateMessageRequest::new("pong"))
                .await?;
            Ok::<(), HandlerError>(())
        }
    })?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let mut config = StorageManager::new()?.load_config(args.config.as_deref())?;
    config.merge_with_args(&args);

    init_logging(&config)?;
    info!(version = discordaio::VERSION, "Starting discordaio");

    let bot = Arc::new(Bot::with_config(&args.token, config)?);
    register_handlers(&bot)?;

    let mut runner = tokio::spawn({
        let bot = Arc::clone(&bot);
        async move { bot.start().await }
    });

    tokio::select! {
        result = &mut runner => return Ok(result??),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for ctrl-c");
                return Ok(runner.await??);
            }
            info!("Shutting down");
        }
    }

    bot.stop().await;
    runner.await??;

    Ok(())
}
