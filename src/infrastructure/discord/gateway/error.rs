use std::io;
use thiserror::Error;

use super::constants::GatewayOpcode;
use crate::domain::errors::HttpError;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to resolve gateway endpoint: {source}")]
    EndpointLookup {
        #[source]
        source: HttpError,
    },

    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("connection closed with code {code}: {reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("websocket error: {message}")]
    WebSocket { message: String },

    #[error("session invalidated, resumable: {resumable}")]
    SessionInvalidated { resumable: bool },

    #[error("gateway requested a reconnect")]
    ReconnectRequested,

    #[error("compression error: {message}")]
    CompressionError { message: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("malformed frame: {message}")]
    Decode { message: String },

    #[error("protocol error: unexpected opcode {opcode:?}")]
    UnexpectedOpcode { opcode: Option<GatewayOpcode> },

    #[error("protocol error: {message}")]
    ProtocolError { message: String },

    #[error("timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("channel closed")]
    ChannelClosed,

    #[error("not connected to gateway")]
    NotConnected,

    #[error("already connecting or connected")]
    AlreadyConnected,

    #[error("gateway shutting down")]
    ShuttingDown,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl GatewayError {
    #[must_use]
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn websocket(message: impl Into<String>) -> Self {
        Self::WebSocket {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn compression(message: impl Into<String>) -> Self {
        Self::CompressionError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// A single malformed inbound frame. The frame is dropped and the
    /// session continues.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Whether a caller-driven reconnect can succeed after this error.
    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        match self {
            Self::EndpointLookup { source } => {
                matches!(
                    source,
                    HttpError::Network { .. } | HttpError::GatewayUnavailable
                )
            }
            Self::ConnectionClosed { code, .. } => match GatewayCloseCode::from_u16(*code) {
                Some(close_code) => !close_code.is_fatal(),
                None => true,
            },
            Self::ConnectionFailed { .. }
            | Self::WebSocket { .. }
            | Self::SessionInvalidated { .. }
            | Self::ReconnectRequested
            | Self::CompressionError { .. }
            | Self::Timeout { .. }
            | Self::ChannelClosed
            | Self::Io(_) => true,
            Self::SerializationError { .. }
            | Self::Decode { .. }
            | Self::UnexpectedOpcode { .. }
            | Self::ProtocolError { .. }
            | Self::NotConnected
            | Self::AlreadyConnected
            | Self::ShuttingDown => false,
        }
    }

    /// Whether the stored session may be resumed on the next connection.
    #[must_use]
    pub const fn can_resume(&self) -> bool {
        match self {
            Self::ConnectionClosed { code, .. } => match GatewayCloseCode::from_u16(*code) {
                Some(close_code) => close_code.is_resumable(),
                None => true,
            },
            Self::SessionInvalidated { resumable } => *resumable,
            Self::WebSocket { .. } | Self::ReconnectRequested | Self::ChannelClosed | Self::Io(_) => {
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn close_code(&self) -> Option<u16> {
        if let Self::ConnectionClosed { code, .. } = self {
            Some(*code)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayCloseCode {
    UnknownError = 4000,
    UnknownOpcode = 4001,
    DecodeError = 4002,
    NotAuthenticated = 4003,
    AuthenticationFailed = 4004,
    AlreadyAuthenticated = 4005,
    InvalidSequence = 4007,
    RateLimited = 4008,
    SessionTimedOut = 4009,
    InvalidShard = 4010,
    ShardingRequired = 4011,
    InvalidApiVersion = 4012,
    InvalidIntents = 4013,
    DisallowedIntents = 4014,
}

impl GatewayCloseCode {
    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        match code {
            4000 => Some(Self::UnknownError),
            4001 => Some(Self::UnknownOpcode),
            4002 => Some(Self::DecodeError),
            4003 => Some(Self::NotAuthenticated),
            4004 => Some(Self::AuthenticationFailed),
            4005 => Some(Self::AlreadyAuthenticated),
            4007 => Some(Self::InvalidSequence),
            4008 => Some(Self::RateLimited),
            4009 => Some(Self::SessionTimedOut),
            4010 => Some(Self::InvalidShard),
            4011 => Some(Self::ShardingRequired),
            4012 => Some(Self::InvalidApiVersion),
            4013 => Some(Self::InvalidIntents),
            4014 => Some(Self::DisallowedIntents),
            _ => None,
        }
    }

    /// The session survives the close and may be resumed.
    #[must_use]
    pub const fn is_resumable(self) -> bool {
        matches!(
            self,
            Self::UnknownError
                | Self::UnknownOpcode
                | Self::DecodeError
                | Self::AlreadyAuthenticated
                | Self::RateLimited
        )
    }

    /// Reconnecting with the same configuration cannot succeed.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidShard
                | Self::ShardingRequired
                | Self::InvalidApiVersion
                | Self::InvalidIntents
                | Self::DisallowedIntents
        )
    }
}

impl From<GatewayCloseCode> for u16 {
    fn from(code: GatewayCloseCode) -> Self {
        code as Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_classification() {
        assert!(GatewayError::connection_failed("test").should_reconnect());
        assert!(GatewayError::ReconnectRequested.should_reconnect());
        assert!(GatewayError::SessionInvalidated { resumable: false }.should_reconnect());
        assert!(!GatewayError::ShuttingDown.should_reconnect());
        assert!(!GatewayError::UnexpectedOpcode { opcode: None }.should_reconnect());
        assert!(
            !GatewayError::EndpointLookup {
                source: HttpError::from_status(401, "401: Unauthorized")
            }
            .should_reconnect()
        );
    }

    #[test]
    fn test_resume_classification() {
        let closed = |code| GatewayError::ConnectionClosed {
            code,
            reason: String::new(),
        };

        assert!(closed(4000).can_resume());
        assert!(closed(1006).can_resume());
        assert!(!closed(4009).can_resume());
        assert!(closed(4009).should_reconnect());
        assert!(!closed(4004).should_reconnect());
        assert!(!GatewayError::SessionInvalidated { resumable: false }.can_resume());
        assert!(GatewayError::SessionInvalidated { resumable: true }.can_resume());
    }

    #[test]
    fn test_close_code_mapping() {
        assert_eq!(
            GatewayCloseCode::from_u16(4004),
            Some(GatewayCloseCode::AuthenticationFailed)
        );
        assert!(GatewayCloseCode::AuthenticationFailed.is_fatal());
        assert!(!GatewayCloseCode::UnknownError.is_fatal());
        assert!(!GatewayCloseCode::SessionTimedOut.is_resumable());
        assert_eq!(GatewayError::decode("bad json").close_code(), None);
        assert!(GatewayError::decode("bad json").is_decode_error());
    }
}
