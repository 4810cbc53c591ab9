//! REST error types.

use thiserror::Error;

/// Failure of a single REST call.
///
/// Rate limiting is absent on purpose: a 429 is retried by the transport and
/// never surfaces to the caller.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum HttpError {
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("no gateway available to process the request, retry later")]
    GatewayUnavailable,

    #[error("unhandled status {status}: {message}")]
    UnhandledStatus { status: u16, message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl HttpError {
    /// Maps a non-success, non-429 status to its typed error.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Self::BadRequest { message },
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            502 => Self::GatewayUnavailable,
            _ => Self::UnhandledStatus { status, message },
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
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
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Status code behind this error, when it came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::GatewayUnavailable => Some(502),
            Self::UnhandledStatus { status, .. } => Some(*status),
            Self::Network { .. } | Self::Decode { .. } | Self::InvalidRequest { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(400, Some(400) ; "bad_request")]
    #[test_case(401, Some(401) ; "unauthorized")]
    #[test_case(403, Some(403) ; "forbidden")]
    #[test_case(404, Some(404) ; "not_found")]
    #[test_case(502, Some(502) ; "gateway_unavailable")]
    #[test_case(418, Some(418) ; "unhandled")]
    fn test_status_roundtrip(status: u16, expected: Option<u16>) {
        assert_eq!(HttpError::from_status(status, "x").status(), expected);
    }

    #[test]
    fn test_status_mapping_variants() {
        assert!(matches!(
            HttpError::from_status(404, "missing"),
            HttpError::NotFound { .. }
        ));
        assert!(matches!(
            HttpError::from_status(500, "boom"),
            HttpError::UnhandledStatus { status: 500, .. }
        ));
        assert!(HttpError::network("down").status().is_none());
    }
}
