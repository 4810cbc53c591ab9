//! The `Bot` facade: handler registration, session lifecycle and the
//! reconnect policy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use super::cache::ReadyCache;
use super::dispatcher::{Dispatcher, HandlerResult};
use super::events::Event;
use crate::domain::entities::{AuthToken, Guild, User};
use crate::domain::errors::{HttpError, RegistrationError};
use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::discord::gateway::{
    DispatchEvent, EventSink, GatewayClient, GatewayClientConfig, GatewayConnection, GatewayError,
    RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX, RECONNECT_JITTER_MAX, WebSocketConnection,
};
use crate::infrastructure::discord::{DiscordClient, HttpClient, ReqwestBackend};

/// Errors surfaced by [`Bot`].
#[derive(Debug, Error)]
pub enum BotError {
    /// The token was empty.
    #[error("invalid bot token")]
    InvalidToken,

    /// The gateway session ended and was not retried.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The REST client could not be built.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Every reconnect attempt failed.
    #[error("gave up reconnecting after {attempts} attempts: {source}")]
    ReconnectLimitExceeded {
        /// Attempts made.
        attempts: u32,
        /// Error from the last attempt.
        #[source]
        source: GatewayError,
    },

    /// `start` was called while a session was already running.
    #[error("bot is already running")]
    AlreadyRunning,
}

/// Feeds gateway events into the cache and the dispatcher.
struct BotSink {
    dispatcher: Arc<Dispatcher>,
    cache: Arc<ReadyCache>,
}

impl EventSink for BotSink {
    fn dispatch(&self, event: DispatchEvent) {
        match &event {
            DispatchEvent::Ready { user, guilds, .. } => {
                self.cache.store_ready(user.clone(), guilds.clone());
            }
            DispatchEvent::GuildCreate(guild) | DispatchEvent::GuildUpdate(guild) => {
                self.cache.upsert_guild(guild.clone());
            }
            DispatchEvent::GuildDelete(guild) if !guild.unavailable => {
                self.cache.remove_guild(guild.id);
            }
            _ => {}
        }

        match Event::try_from(event) {
            Ok(event) => self.dispatcher.dispatch(event),
            Err(unhandled) => trace!(event = ?unhandled, "No handler slot for event"),
        }
    }
}

/// A Discord bot: one gateway session plus a REST client.
///
/// Share it behind an `Arc` to call [`stop`](Self::stop) while
/// [`start`](Self::start) is running.
pub struct Bot {
    config: ClientConfig,
    token: AuthToken,
    rest: DiscordClient,
    dispatcher: Arc<Dispatcher>,
    cache: Arc<ReadyCache>,
    cancel: Mutex<CancellationToken>,
    running: watch::Sender<bool>,
}

impl Bot {
    /// # Errors
    /// Returns error if the token is empty or the HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self, BotError> {
        Self::with_config(token, ClientConfig::default())
    }

    /// # Errors
    /// Returns error if the token is empty or the HTTP client cannot be built.
    pub fn with_config(token: impl Into<String>, config: ClientConfig) -> Result<Self, BotError> {
        let token = AuthToken::new(token).ok_or(BotError::InvalidToken)?;
        let backend = ReqwestBackend::new(&config.user_agent, config.request_timeout())?;
        let http = HttpClient::new(Arc::new(backend), config.api_base_url.clone(), token.clone());

        Ok(Self::from_parts(token, config, DiscordClient::new(Arc::new(http))))
    }

    fn from_parts(token: AuthToken, config: ClientConfig, rest: DiscordClient) -> Self {
        let (running, _) = watch::channel(false);

        Self {
            dispatcher: Arc::new(Dispatcher::new(config.max_concurrent_handlers)),
            cache: Arc::new(ReadyCache::new()),
            cancel: Mutex::new(CancellationToken::new()),
            running,
            config,
            token,
            rest,
        }
    }

    /// Registers a handler by name, e.g. `on_message`. See also
    /// [`subscribe!`](crate::subscribe).
    ///
    /// # Errors
    /// Returns error for an unknown name or a name that already has a handler.
    pub fn on<F, Fut>(&self, name: &str, handler: F) -> Result<(), RegistrationError>
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.dispatcher.on(name, handler)
    }

    /// Connects and processes events until [`stop`](Self::stop) is called or
    /// the session ends for good.
    ///
    /// # Errors
    ///
    /// The first connection failure is returned as is. Later disconnects are
    /// retried when `auto_reconnect` is set, and the last error is returned
    /// once retrying stops.
    pub async fn start(&self) -> Result<(), BotError> {
        let connection = WebSocketConnection::new(self.config.transport_compression);
        self.start_with_connection(Box::new(connection)).await
    }

    /// [`start`](Self::start) over a caller-supplied transport.
    ///
    /// # Errors
    /// See [`start`](Self::start).
    pub async fn start_with_connection(
        &self,
        connection: Box<dyn GatewayConnection>,
    ) -> Result<(), BotError> {
        let cancel = {
            let current = self.cancel.lock();
            if self.running.send_replace(true) {
                return Err(BotError::AlreadyRunning);
            }
            current.clone()
        };

        let sink = Arc::new(BotSink {
            dispatcher: Arc::clone(&self.dispatcher),
            cache: Arc::clone(&self.cache),
        });
        let mut gateway = GatewayClient::new(
            self.rest.clone(),
            connection,
            self.token.clone(),
            GatewayClientConfig::from(&self.config),
            sink,
        );

        let result = self.drive(&mut gateway, &cancel).await;
        gateway.close().await;

        {
            let mut current = self.cancel.lock();
            *current = CancellationToken::new();
            self.running.send_replace(false);
        }

        if let Err(e) = &result {
            error!(error = %e, "Bot stopped with error");
        }
        result
    }

    async fn drive(
        &self,
        gateway: &mut GatewayClient,
        cancel: &CancellationToken,
    ) -> Result<(), BotError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            result = gateway.connect() => result?,
        }

        loop {
            let error = match gateway.run(cancel.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            if !self.reconnect(gateway, cancel, error).await? {
                return Ok(());
            }
        }
    }

    /// Returns `Ok(false)` when cancelled while reconnecting.
    async fn reconnect(
        &self,
        gateway: &mut GatewayClient,
        cancel: &CancellationToken,
        mut error: GatewayError,
    ) -> Result<bool, BotError> {
        let policy = &self.config.reconnect;
        let mut attempts: u32 = 0;

        loop {
            if !policy.auto_reconnect || !error.should_reconnect() {
                return Err(error.into());
            }

            if attempts >= policy.max_attempts {
                error!(attempts, "Max reconnection attempts exceeded");
                return Err(BotError::ReconnectLimitExceeded {
                    attempts,
                    source: error,
                });
            }

            if invalidates_session(&error) {
                gateway.reset_session();
            }

            let delay = calculate_backoff_delay(attempts);
            attempts += 1;
            info!(
                attempt = attempts,
                delay_ms = delay.as_millis(),
                resume = gateway.session().can_resume(),
                error = %error,
                "Reconnecting to gateway"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(false),
                () = sleep(delay) => {}
            }

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(false),
                result = gateway.connect() => result,
            };

            match result {
                Ok(()) => {
                    info!(attempts, "Reconnected to gateway");
                    return Ok(true);
                }
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "Reconnect attempt failed");
                    error = e;
                }
            }
        }
    }

    /// Cancels the session, closes the transport and waits up to the drain
    /// timeout for in-flight handlers.
    ///
    /// A stop issued while no session is running is held, and the next
    /// [`start`](Self::start) returns `Ok(())` without connecting.
    pub async fn stop(&self) {
        self.cancel.lock().cancel();

        let mut running = self.running.subscribe();
        let _ = running.wait_for(|running| !running).await;

        let drained = self
            .dispatcher
            .drain(self.config.handler_drain_timeout())
            .await;
        info!(drained, "Bot stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    #[must_use]
    pub const fn rest(&self) -> &DiscordClient {
        &self.rest
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The bot's own user, once `READY` has been received.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.cache.current_user()
    }

    #[must_use]
    pub fn guilds(&self) -> Vec<Guild> {
        self.cache.guilds()
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("token", &self.token)
            .field("dispatcher", &self.dispatcher)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// The server-side session is gone; the next connection must identify.
fn invalidates_session(error: &GatewayError) -> bool {
    match error {
        GatewayError::SessionInvalidated { resumable } => !resumable,
        GatewayError::ConnectionClosed { .. } => !error.can_resume(),
        _ => false,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn calculate_backoff_delay(attempt: u32) -> Duration {
    let jitter_max = RECONNECT_JITTER_MAX.as_millis() as u64;
    backoff_delay(attempt, Duration::from_millis(rand_jitter(jitter_max)))
}

/// `base * 2^min(attempt, 6)`, capped at the maximum, plus `jitter`.
fn backoff_delay(attempt: u32, jitter: Duration) -> Duration {
    let exponential = RECONNECT_DELAY_BASE.saturating_mul(1 << attempt.min(6));
    exponential.min(RECONNECT_DELAY_MAX).saturating_add(jitter)
}

fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;

    if max == 0 {
        return 0;
    }

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);

    nanos % max
}
