//! Gateway session: transport, handshake, heartbeat and dispatch decoding.

mod client;
mod codec;
mod connection;
mod constants;
mod error;
mod events;
mod heartbeat;
mod payloads;
mod session;
mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{EventSink, GatewayClient, GatewayClientConfig};
pub use codec::{EventParser, GatewayCodec};
pub use connection::{GatewayConnection, WebSocketConnection};
pub use constants::{
    GatewayOpcode, LARGE_THRESHOLD, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX,
    RECONNECT_JITTER_MAX,
};
pub use error::{GatewayCloseCode, GatewayError, GatewayResult};
pub use events::{DispatchEvent, PresenceStatus};
pub use payloads::GatewayPayload;
pub use session::SessionInfo;
pub use state::{ConnectionState, GatewayState};
