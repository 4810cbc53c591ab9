//! Discord API client: REST transport, typed endpoints and the gateway.

mod client;
mod dto;
pub mod gateway;
mod http;

pub use client::DiscordClient;
pub use dto::{
    CreateChannelRequest, CreateMessageRequest, EditMessageRequest, ErrorResponse,
    GatewayBotResponse, GetMessagesQuery, RateLimitResponse,
};
pub use gateway::{
    DispatchEvent, EventSink, GatewayClient, GatewayClientConfig, GatewayConnection,
    GatewayError, PresenceStatus, WebSocketConnection,
};
pub use http::{HttpClient, RATE_LIMIT_REMAINING_HEADER, RateLimitState, ReqwestBackend};
