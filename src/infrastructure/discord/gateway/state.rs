use tokio::time::Instant;

/// Lifecycle of one session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    AwaitingHello,
    Active,
    Closed,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// A connection attempt is in flight or established.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Connecting | Self::AwaitingHello | Self::Active)
    }

    #[must_use]
    pub const fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::AwaitingHello => write!(f, "Waiting for Hello"),
            Self::Active => write!(f, "Active"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Connection state plus heartbeat bookkeeping.
#[derive(Debug, Default)]
pub struct GatewayState {
    connection: ConnectionState,
    heartbeat_interval_ms: Option<u64>,
    last_heartbeat_sent: Option<Instant>,
    last_heartbeat_ack: Option<Instant>,
    latency_ms: Option<u64>,
    started_at: Option<Instant>,
}

impl GatewayState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub const fn transition_to_connecting(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    pub const fn transition_to_awaiting_hello(&mut self) {
        self.connection = ConnectionState::AwaitingHello;
    }

    pub fn transition_to_active(&mut self) {
        self.connection = ConnectionState::Active;
        self.started_at = Some(Instant::now());
    }

    pub const fn transition_to_closed(&mut self) {
        self.connection = ConnectionState::Closed;
        self.last_heartbeat_sent = None;
        self.last_heartbeat_ack = None;
        self.started_at = None;
    }

    /// Returns to `Idle` after a failed connection attempt.
    pub const fn transition_to_idle(&mut self) {
        self.connection = ConnectionState::Idle;
    }

    pub const fn set_heartbeat_interval(&mut self, interval_ms: u64) {
        self.heartbeat_interval_ms = Some(interval_ms);
    }

    #[must_use]
    pub const fn heartbeat_interval_ms(&self) -> Option<u64> {
        self.heartbeat_interval_ms
    }

    pub fn record_heartbeat_sent(&mut self) {
        self.last_heartbeat_sent = Some(Instant::now());
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn record_heartbeat_ack(&mut self) {
        let now = Instant::now();
        if let Some(sent) = self.last_heartbeat_sent {
            self.latency_ms = Some(now.duration_since(sent).as_millis() as u64);
        }
        self.last_heartbeat_ack = Some(now);
    }

    /// Round trip of the last acknowledged heartbeat.
    #[must_use]
    pub const fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    #[must_use]
    pub fn uptime(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| start.elapsed())
    }
}
