//! Request and response bodies of the REST API that are not resource records.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{ChannelId, ChannelKind, Embed, MessageId, Overwrite};

/// Discord API error response structure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error message from Discord.
    pub message: String,
}

/// Body of a 429 response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateLimitResponse {
    #[serde(default)]
    pub message: String,
    /// Milliseconds to wait before retrying.
    #[serde(default = "default_retry_after")]
    pub retry_after: f64,
    /// Whether the limit applies to every route.
    #[serde(default)]
    pub global: bool,
}

impl Default for RateLimitResponse {
    fn default() -> Self {
        Self {
            message: String::new(),
            retry_after: default_retry_after(),
            global: false,
        }
    }
}

const fn default_retry_after() -> f64 {
    1000.0
}

/// `GET /gateway/bot` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayBotResponse {
    /// WebSocket URL of the gateway, without query parameters.
    pub url: String,
    /// Recommended number of shards.
    #[serde(default = "default_shards")]
    pub shards: u32,
}

const fn default_shards() -> u32 {
    1
}

/// Body of `POST /guilds/{id}/channels`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChannelKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permission_overwrites: Vec<Overwrite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChannelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
}

impl CreateChannelRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: ChannelKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub const fn with_parent(mut self, parent_id: ChannelId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Query of `GET /channels/{id}/messages`. At most one anchor is honored by
/// the API.
#[derive(Debug, Clone, Default)]
pub struct GetMessagesQuery {
    pub limit: Option<u8>,
    pub before: Option<MessageId>,
    pub after: Option<MessageId>,
    pub around: Option<MessageId>,
}

impl GetMessagesQuery {
    #[must_use]
    pub const fn with_limit(mut self, limit: u8) -> Self {
        self.limit = Some(if limit < 100 { limit } else { 100 });
        self
    }

    #[must_use]
    pub const fn before_message(mut self, message_id: MessageId) -> Self {
        self.before = Some(message_id);
        self
    }

    #[must_use]
    pub const fn after_message(mut self, message_id: MessageId) -> Self {
        self.after = Some(message_id);
        self
    }

    #[must_use]
    pub const fn around_message(mut self, message_id: MessageId) -> Self {
        self.around = Some(message_id);
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        for (key, value) in [
            ("before", self.before),
            ("after", self.after),
            ("around", self.around),
        ] {
            if let Some(id) = value {
                query.push((key.to_string(), id.to_string()));
            }
        }
        query
    }
}

/// Body of `POST /channels/{id}/messages`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessageRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
}

impl CreateMessageRequest {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    #[must_use]
    pub const fn with_tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }
}

/// Body of `PATCH /channels/{id}/messages/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditMessageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
}

impl EditMessageRequest {
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
        }
    }
}
