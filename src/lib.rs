//! discordaio - an async Discord bot library.
//!
//! A [`Bot`] keeps one gateway session alive: it identifies, heartbeats,
//! resumes after dropped connections and hands every dispatched event to the
//! handler registered under the event's name. A REST client for the common
//! channel, guild and message endpoints comes along with it.
//!
//! ```no_run
//! use discordaio::{Bot, Event, HandlerResult, subscribe};
//!
//! async fn on_message(event: Event) -> HandlerResult {
//!     if let Event::Message(message) = event {
//!         println!("{}: {}", message.author.username, message.content);
//!     }
//!     Ok(())
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let bot = Bot::new("token")?;
//! subscribe!(bot, on_message)?;
//! bot.start().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Bot facade, event catalogue and handler dispatch.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer: configuration, REST client and gateway session.
pub mod infrastructure;

pub use application::{Bot, BotError, Event, EventName, HandlerError, HandlerResult};
pub use infrastructure::{ClientConfig, DiscordClient};

/// Current version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = "discordaio";
