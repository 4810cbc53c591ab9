use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::codec::EventParser;
use super::connection::GatewayConnection;
use super::constants::{GatewayOpcode, HELLO_TIMEOUT, LARGE_THRESHOLD};
use super::error::{GatewayError, GatewayResult};
use super::events::DispatchEvent;
use super::heartbeat::HeartbeatManager;
use super::payloads::GatewayPayload;
use super::session::SessionInfo;
use super::state::GatewayState;
use crate::domain::entities::AuthToken;
use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::discord::DiscordClient;

const OUTBOUND_CHANNEL_SIZE: usize = 32;

/// Receives decoded dispatch events from the read loop.
///
/// Called inline by the read loop, so implementations must not block.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: DispatchEvent);
}

impl EventSink for mpsc::UnboundedSender<DispatchEvent> {
    fn dispatch(&self, event: DispatchEvent) {
        if self.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayClientConfig {
    pub version: u8,
    pub compress: bool,
    pub large_threshold: u32,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self {
            version: 6,
            compress: false,
            large_threshold: LARGE_THRESHOLD,
        }
    }
}

impl GatewayClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use]
    pub const fn with_large_threshold(mut self, threshold: u32) -> Self {
        self.large_threshold = threshold;
        self
    }

    fn endpoint(&self, base: &str) -> String {
        let mut url = format!("{base}?v={}&encoding=json", self.version);
        if self.compress {
            url.push_str("&compress=zlib-stream");
        }
        url
    }
}

impl From<&ClientConfig> for GatewayClientConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            version: config.gateway_version,
            compress: config.transport_compression,
            large_threshold: config.large_threshold,
        }
    }
}

/// Owns one gateway connection and the session that outlives it.
///
/// [`connect`](Self::connect) drives `Idle -> Connecting -> AwaitingHello ->
/// Active`; [`run`](Self::run) reads frames until the connection ends or the
/// cancellation token fires, then leaves the manager `Closed`. Reconnecting
/// is the caller's call: a later `connect` resumes when the session allows.
///
/// The read loop is the only writer on the connection. Heartbeats are queued
/// on a channel and sent from the loop.
pub struct GatewayClient {
    rest: DiscordClient,
    connection: Box<dyn GatewayConnection>,
    token: AuthToken,
    config: GatewayClientConfig,
    sink: Arc<dyn EventSink>,
    state: GatewayState,
    session: SessionInfo,
    heartbeat: Option<HeartbeatManager>,
    outbound_tx: mpsc::Sender<GatewayPayload>,
    outbound_rx: mpsc::Receiver<GatewayPayload>,
    gateway_url: Option<String>,
}

impl GatewayClient {
    #[must_use]
    pub fn new(
        rest: DiscordClient,
        connection: Box<dyn GatewayConnection>,
        token: AuthToken,
        config: GatewayClientConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_SIZE);

        Self {
            rest,
            connection,
            token,
            config,
            sink,
            state: GatewayState::new(),
            session: SessionInfo::new(),
            heartbeat: None,
            outbound_tx,
            outbound_rx,
            gateway_url: None,
        }
    }

    /// Opens the connection and completes the handshake.
    ///
    /// # Errors
    ///
    /// Endpoint lookup, transport and handshake failures. The manager is
    /// back in `Idle` afterwards.
    pub async fn connect(&mut self) -> GatewayResult<()> {
        if !self.state.connection().can_start() {
            return Err(GatewayError::AlreadyConnected);
        }

        self.state.transition_to_connecting();

        match self.open().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.teardown().await;
                self.state.transition_to_idle();
                Err(e)
            }
        }
    }

    async fn open(&mut self) -> GatewayResult<()> {
        let url = self.resolve_url().await?;
        info!(url = %url, "Connecting to gateway");

        self.connection.connect(&url).await?;
        while self.outbound_rx.try_recv().is_ok() {}
        self.state.transition_to_awaiting_hello();

        let hello = timeout(HELLO_TIMEOUT, self.await_hello())
            .await
            .map_err(|_| GatewayError::timeout("hello"))??;

        self.handle_hello(&hello).await
    }

    async fn resolve_url(&mut self) -> GatewayResult<String> {
        let base = match &self.gateway_url {
            Some(url) => url.clone(),
            None => {
                let gateway = self
                    .rest
                    .get_gateway_bot()
                    .await
                    .map_err(|source| GatewayError::EndpointLookup { source })?;
                self.gateway_url = Some(gateway.url.clone());
                gateway.url
            }
        };

        Ok(self.config.endpoint(&base))
    }

    async fn await_hello(&mut self) -> GatewayResult<GatewayPayload> {
        loop {
            match self.connection.receive().await {
                Ok(frame) if frame.opcode() == Some(GatewayOpcode::Hello) => return Ok(frame),
                Ok(frame) => {
                    return Err(GatewayError::UnexpectedOpcode {
                        opcode: frame.opcode(),
                    });
                }
                Err(e) if e.is_decode_error() => {
                    warn!(error = %e, "Dropping malformed frame before hello");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn handle_hello(&mut self, frame: &GatewayPayload) -> GatewayResult<()> {
        let hello = EventParser::parse_hello(&frame.d)?;
        if hello.heartbeat_interval == 0 {
            return Err(GatewayError::protocol("hello carried a zero heartbeat interval"));
        }

        if let Some(mut stale) = self.heartbeat.take() {
            stale.stop();
        }
        self.state.set_heartbeat_interval(hello.heartbeat_interval);
        debug!(interval_ms = hello.heartbeat_interval, "Received hello");

        let resume = self
            .session
            .session_id()
            .map(str::to_owned)
            .zip(self.session.sequence());

        let handshake = match resume {
            Some((session_id, sequence)) => {
                info!(session_id = %session_id, sequence, "Resuming session");
                GatewayPayload::resume(self.token.as_str(), &session_id, sequence)
            }
            None => {
                debug!("Identifying");
                self.session.clear();
                GatewayPayload::identify(self.token.as_str(), self.config.large_threshold)
            }
        };
        self.connection.send(&handshake).await?;

        let mut heartbeat =
            HeartbeatManager::new(hello.heartbeat_interval, self.session.sequence_handle());
        heartbeat.start(self.outbound_tx.clone());
        self.heartbeat = Some(heartbeat);

        self.state.transition_to_active();
        Ok(())
    }

    /// Reads frames until the connection ends or `cancel` fires.
    ///
    /// Returns `Ok(())` only for cancellation. Either way the heartbeat is
    /// stopped and the transport closed before returning.
    ///
    /// # Errors
    ///
    /// The error that ended the connection: closure, transport failure,
    /// reconnect request or session invalidation.
    pub async fn run(&mut self, cancel: CancellationToken) -> GatewayResult<()> {
        if !self.state.connection().is_active() {
            return Err(GatewayError::NotConnected);
        }

        let result = self.read_loop(&cancel).await;
        match &result {
            Ok(()) => info!("Gateway stopped"),
            Err(e) => warn!(error = %e, "Gateway connection ended"),
        }

        self.teardown().await;
        result
    }

    async fn read_loop(&mut self, cancel: &CancellationToken) -> GatewayResult<()> {
        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => return Ok(()),

                Some(payload) = self.outbound_rx.recv() => {
                    self.send_heartbeat(&payload).await?;
                }

                result = self.connection.receive() => {
                    let outcome = match result {
                        Ok(frame) => self.handle_frame(frame).await,
                        Err(e) => Err(e),
                    };

                    match outcome {
                        Err(e) if e.is_decode_error() => {
                            warn!(error = %e, "Dropping malformed frame");
                        }
                        Err(e) => return Err(e),
                        Ok(()) => {}
                    }
                }
            }
        }
    }

    async fn handle_frame(&mut self, frame: GatewayPayload) -> GatewayResult<()> {
        match frame.opcode() {
            Some(GatewayOpcode::Dispatch) => {
                self.session.update_sequence(frame.s);
                match frame.t {
                    Some(event_type) => self.handle_dispatch(&event_type, frame.d),
                    None => warn!(sequence = ?frame.s, "Dispatch frame without event name"),
                }
            }
            Some(GatewayOpcode::HeartbeatAck) => {
                self.state.record_heartbeat_ack();
                if let Some(heartbeat) = &self.heartbeat {
                    heartbeat.acknowledge();
                }
                debug!(latency_ms = ?self.state.latency_ms(), "Heartbeat acknowledged");
            }
            Some(GatewayOpcode::Heartbeat) => {
                debug!("Gateway requested immediate heartbeat");
                let payload = GatewayPayload::heartbeat(self.session.sequence());
                self.send_heartbeat(&payload).await?;
            }
            Some(GatewayOpcode::Reconnect) => {
                info!("Gateway requested reconnect");
                return Err(GatewayError::ReconnectRequested);
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = frame.d.as_bool().unwrap_or(false);
                warn!(resumable, "Session invalidated");

                if !resumable {
                    self.session.clear();
                }
                return Err(GatewayError::SessionInvalidated { resumable });
            }
            Some(GatewayOpcode::Hello) => {
                info!("Hello received while active, restarting handshake");
                self.handle_hello(&frame).await?;
            }
            opcode => debug!(op = frame.op, opcode = ?opcode, "Ignoring frame"),
        }

        Ok(())
    }

    fn handle_dispatch(&mut self, event_type: &str, data: serde_json::Value) {
        match EventParser::parse_dispatch(event_type, data) {
            Ok(DispatchEvent::Unknown { event_type }) => {
                debug!(event = %event_type, "Ignoring unknown dispatch event");
            }
            Ok(event) => {
                match &event {
                    DispatchEvent::Ready { session_id, user, guilds } => {
                        info!(
                            session_id = %session_id,
                            user = %user,
                            guilds = guilds.len(),
                            "Gateway ready"
                        );
                        self.session.set_session(session_id.clone());
                    }
                    DispatchEvent::Resumed => info!("Session resumed"),
                    _ => debug!(event = event_type, "Dispatching event"),
                }
                self.sink.dispatch(event);
            }
            Err(e) => {
                warn!(event = event_type, error = %e, "Dropping malformed dispatch payload");
            }
        }
    }

    async fn send_heartbeat(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        self.connection.send(payload).await?;
        self.state.record_heartbeat_sent();
        debug!(sequence = ?self.session.sequence(), "Sent heartbeat");
        Ok(())
    }

    async fn teardown(&mut self) {
        if let Some(mut heartbeat) = self.heartbeat.take() {
            heartbeat.stop();
        }
        if let Err(e) = self.connection.close().await {
            debug!(error = %e, "Error while closing gateway connection");
        }
        self.state.transition_to_closed();
    }

    /// Stops the heartbeat and closes the transport without waiting for a
    /// running [`run`](Self::run).
    pub async fn close(&mut self) {
        self.teardown().await;
    }

    /// Forgets the session so the next `connect` identifies from scratch.
    pub fn reset_session(&mut self) {
        self.session.clear();
    }

    #[must_use]
    pub const fn session(&self) -> &SessionInfo {
        &self.session
    }

    #[must_use]
    pub const fn state(&self) -> &GatewayState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &GatewayClientConfig {
        &self.config
    }
}
