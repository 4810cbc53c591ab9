//! Application layer: the bot facade, event catalogue and handler dispatch.

mod bot;
mod cache;
mod dispatcher;
mod events;

pub use bot::{Bot, BotError};
pub use cache::ReadyCache;
pub use dispatcher::{Dispatcher, HandlerError, HandlerResult};
pub use events::{Event, EventName};
