use chrono::{DateTime, Utc};

use crate::domain::entities::{
    Activity, Channel, ChannelId, ChannelMessage, Emoji, Guild, GuildId, GuildMember, MessageId,
    User, UserId,
};

/// A dispatch frame decoded by event name.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum DispatchEvent {
    Ready {
        session_id: String,
        user: User,
        guilds: Vec<Guild>,
    },
    Resumed,

    GuildCreate(Guild),
    GuildUpdate(Guild),
    GuildDelete(Guild),
    GuildBanAdd {
        guild_id: GuildId,
        user: User,
    },
    GuildBanRemove {
        guild_id: GuildId,
        user: User,
    },
    GuildMemberAdd {
        guild_id: GuildId,
        member: GuildMember,
    },
    GuildMemberRemove {
        guild_id: GuildId,
        user: User,
    },

    ChannelCreate(Channel),
    ChannelUpdate(Channel),
    ChannelDelete(Channel),

    MessageCreate(ChannelMessage),
    MessageUpdate(ChannelMessage),
    MessageDelete {
        message_id: MessageId,
        channel_id: ChannelId,
    },
    MessageDeleteBulk {
        message_ids: Vec<MessageId>,
        channel_id: ChannelId,
    },
    MessageReactionAdd {
        user_id: UserId,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: Emoji,
    },
    MessageReactionRemove {
        user_id: UserId,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: Emoji,
    },
    MessageReactionRemoveAll {
        channel_id: ChannelId,
        message_id: MessageId,
    },

    TypingStart {
        user_id: UserId,
        channel_id: ChannelId,
        timestamp: DateTime<Utc>,
    },
    PresenceUpdate {
        user_id: UserId,
        guild_id: Option<GuildId>,
        status: PresenceStatus,
        activity: Option<Activity>,
    },

    /// An event name this library does not decode.
    Unknown {
        event_type: String,
    },
}

impl DispatchEvent {
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenceStatus {
    Online,
    Idle,
    DoNotDisturb,
    Invisible,
    #[default]
    Offline,
}

impl PresenceStatus {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "online" => Self::Online,
            "idle" => Self::Idle,
            "dnd" => Self::DoNotDisturb,
            "invisible" => Self::Invisible,
            _ => Self::Offline,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::DoNotDisturb => "dnd",
            Self::Invisible => "invisible",
            Self::Offline => "offline",
        }
    }

    #[must_use]
    pub const fn is_online(&self) -> bool {
        !matches!(self, Self::Offline | Self::Invisible)
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_status_parse() {
        assert_eq!(PresenceStatus::parse("DND"), PresenceStatus::DoNotDisturb);
        assert_eq!(PresenceStatus::parse("mystery"), PresenceStatus::Offline);
        assert!(PresenceStatus::Idle.is_online());
        assert!(!PresenceStatus::Invisible.is_online());
        assert_eq!(PresenceStatus::Online.to_string(), "online");
    }
}
