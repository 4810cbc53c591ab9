//! Bot authentication token value object.

use std::fmt;

/// Bot token sent in the `Authorization` header and inside gateway
/// identify/resume frames. `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    value: String,
}

impl AuthToken {
    /// Creates a token, trimming whitespace and any `Bot ` prefix the caller
    /// copied along from the developer portal.
    ///
    /// Returns `None` for an empty token.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let value = value.trim_start();
        let value = value.strip_prefix("Bot ").unwrap_or(value).trim();

        if value.is_empty() {
            return None;
        }

        Some(Self {
            value: value.to_string(),
        })
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Value of the REST `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bot {}", self.value)
    }

    /// Returns masked token for display.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let visible_prefix = &self.value[..4];
        let visible_suffix = &self.value[self.value.len() - 4..];
        format!("{visible_prefix}...{visible_suffix}")
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &self.masked())
            .finish()
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}
