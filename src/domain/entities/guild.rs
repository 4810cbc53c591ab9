//! Discord guild entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Channel, ChannelId, DISCORD_CDN, Emoji, Role, RoleId, User, UserId};

snowflake_id!(
    /// Unique identifier for a Discord guild (server).
    GuildId
);

macro_rules! level_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        #[serde(from = "u8", into = "u8")]
        pub enum $name {
            #[default]
            $($variant,)+
            Unknown(u8),
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(level: $name) -> Self {
                match level {
                    $($name::$variant => $value,)+
                    $name::Unknown(other) => other,
                }
            }
        }
    };
}

level_enum!(
    /// Verification level required for the guild.
    VerificationLevel {
        None = 0,
        Low = 1,
        Medium = 2,
        High = 3,
        VeryHigh = 4,
    }
);

level_enum!(
    /// Default message notifications level.
    MessageNotificationLevel {
        AllMessages = 0,
        OnlyMentions = 1,
    }
);

level_enum!(
    ExplicitContentFilterLevel {
        Disabled = 0,
        MembersWithoutRoles = 1,
        AllMembers = 2,
    }
);

level_enum!(
    /// Required MFA level for moderation actions.
    MfaLevel {
        None = 0,
        Elevated = 1,
    }
);

/// A user's membership in a guild.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildMember {
    #[serde(default)]
    pub user: User,
    /// Guild nickname, if one is set.
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
}

impl std::fmt::Display for GuildMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.user.fmt(f)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ban {
    #[serde(default)]
    pub reason: Option<String>,
    pub user: User,
}

/// A guild, referred to as a "server" in the UI.
///
/// Guilds received in `READY` are unavailable stubs carrying only `id` and
/// `unavailable`; everything else is filled by the subsequent `GUILD_CREATE`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guild {
    pub id: GuildId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub splash: Option<String>,
    /// Whether the current user owns the guild.
    #[serde(default)]
    pub owner: bool,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    /// Total permissions for the current user, without channel overrides.
    #[serde(default, deserialize_with = "crate::domain::serde_utils::lenient_u64::deserialize")]
    pub permissions: u64,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub afk_channel_id: Option<ChannelId>,
    /// In seconds.
    #[serde(default)]
    pub afk_timeout: u32,
    #[serde(default)]
    pub verification_level: VerificationLevel,
    #[serde(default)]
    pub default_message_notifications: MessageNotificationLevel,
    #[serde(default)]
    pub explicit_content_filter: ExplicitContentFilterLevel,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub mfa_level: MfaLevel,
    /// Set when the guild was created by a bot.
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub widget_enabled: bool,
    #[serde(default)]
    pub widget_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub system_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub large: bool,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub member_count: Option<u32>,
    #[serde(default)]
    pub members: Vec<GuildMember>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Guild {
    #[must_use]
    pub fn is_owner(&self, member: &GuildMember) -> bool {
        self.owner_id == Some(member.user.id)
    }

    #[must_use]
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_ref()
            .map(|hash| format!("{DISCORD_CDN}/icons/{}/{hash}.png", self.id))
    }

    #[must_use]
    pub fn splash_url(&self) -> Option<String> {
        self.splash
            .as_ref()
            .map(|hash| format!("{DISCORD_CDN}/splashes/{}/{hash}.png", self.id))
    }
}

impl std::fmt::Display for Guild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_create_payload() {
        let guild: Guild = serde_json::from_value(serde_json::json!({
            "id": "197038439483310086",
            "name": "Discord Testers",
            "icon": "f64c482b807da4f539cff778d174971c",
            "owner_id": "73193882359173120",
            "verification_level": 3,
            "default_message_notifications": 1,
            "explicit_content_filter": 2,
            "mfa_level": 1,
            "roles": [{"id": "197038439483310086", "name": "@everyone", "permissions": "104320577"}],
            "emojis": [],
            "features": ["COMMUNITY"],
            "members": [
                {"user": {"id": "73193882359173120", "username": "owner", "discriminator": "0001"},
                 "roles": [], "joined_at": "2016-06-29T17:03:54.366000+00:00", "deaf": false, "mute": false}
            ],
            "channels": [{"id": "197038439483310086", "type": 0, "name": "general"}]
        }))
        .unwrap();

        assert_eq!(guild.verification_level, VerificationLevel::High);
        assert_eq!(
            guild.default_message_notifications,
            MessageNotificationLevel::OnlyMentions
        );
        assert_eq!(guild.mfa_level, MfaLevel::Elevated);
        assert_eq!(guild.roles[0].permissions, 104_320_577);
        assert!(guild.is_owner(&guild.members[0]));
        assert_eq!(guild.channels[0].name.as_deref(), Some("general"));
        assert_eq!(
            guild.icon_url().as_deref(),
            Some(
                "https://cdn.discordapp.com/icons/197038439483310086/f64c482b807da4f539cff778d174971c.png"
            )
        );
    }

    #[test]
    fn test_unavailable_guild_stub() {
        let guild: Guild =
            serde_json::from_value(serde_json::json!({"id": "41771983423143937", "unavailable": true}))
                .unwrap();

        assert!(guild.unavailable);
        assert!(guild.name.is_empty());
        assert_eq!(guild.verification_level, VerificationLevel::None);
    }

    #[test]
    fn test_unknown_level_is_preserved() {
        assert_eq!(VerificationLevel::from(9), VerificationLevel::Unknown(9));
        assert_eq!(u8::from(MfaLevel::Unknown(7)), 7);
    }
}
