//! Discord channel entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GuildId, MessageId, User, UserId};

snowflake_id!(
    /// Unique identifier for a Discord channel.
    ChannelId
);

/// Discord channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    /// Guild text channel.
    #[default]
    GuildText,
    /// Direct message between users.
    Dm,
    /// Guild voice channel.
    GuildVoice,
    /// Direct message between multiple users.
    GroupDm,
    /// Organizational category.
    GuildCategory,
    /// Any type this library does not know about.
    Unknown(u8),
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::GuildText => 0,
            ChannelKind::Dm => 1,
            ChannelKind::GuildVoice => 2,
            ChannelKind::GroupDm => 3,
            ChannelKind::GuildCategory => 4,
            ChannelKind::Unknown(other) => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteKind {
    #[default]
    Role,
    Member,
}

/// Explicit permission overwrite for a role or member.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Overwrite {
    /// Role or user id.
    #[serde(with = "crate::domain::serde_utils::snowflake")]
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: OverwriteKind,
    #[serde(default, deserialize_with = "crate::domain::serde_utils::lenient_u64::deserialize")]
    pub allow: u64,
    #[serde(default, deserialize_with = "crate::domain::serde_utils::lenient_u64::deserialize")]
    pub deny: u64,
}

/// A guild or DM channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(rename = "type", default)]
    pub kind: ChannelKind,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    /// Sorting position of the channel.
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub permission_overwrites: Vec<Overwrite>,
    /// 2-100 characters.
    #[serde(default)]
    pub name: Option<String>,
    /// 0-1024 characters.
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    /// May not point to an existing or valid message.
    #[serde(default)]
    pub last_message_id: Option<MessageId>,
    /// Bitrate (in bits) of a voice channel.
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub user_limit: Option<u32>,
    /// Recipients of a DM.
    #[serde(default)]
    pub recipients: Vec<User>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Id of the DM creator.
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub application_id: Option<String>,
    /// Parent category of a guild channel.
    #[serde(default)]
    pub parent_id: Option<ChannelId>,
    #[serde(default)]
    pub last_pin_timestamp: Option<DateTime<Utc>>,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name.as_deref().unwrap_or_default(), self.id)
    }
}
