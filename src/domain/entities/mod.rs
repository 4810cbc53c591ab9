//! Domain entity definitions.
//!
//! Each record lists its fields explicitly and derives its decoder, so a
//! renamed or missing wire field shows up in tests instead of being absorbed.

/// Declares a snowflake identifier newtype that decodes from a string or an
/// integer and serializes back as a string.
macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Default,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "crate::domain::serde_utils::snowflake")] pub u64);

        impl $name {
            /// Returns the underlying u64 value.
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                value.parse().map(Self)
            }
        }
    };
}

mod activity;
mod channel;
mod emoji;
mod guild;
mod message;
mod role;
mod token;
mod user;

pub use activity::{Activity, ActivityAssets, ActivityKind, ActivityParty, ActivityTimestamps};
pub use channel::{Channel, ChannelId, ChannelKind, Overwrite, OverwriteKind};
pub use emoji::{Emoji, EmojiId};
pub use guild::{
    Ban, ExplicitContentFilterLevel, Guild, GuildId, GuildMember, MessageNotificationLevel,
    MfaLevel, VerificationLevel,
};
pub use message::{
    Attachment, ChannelMessage, Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedImage,
    EmbedProvider, EmbedThumbnail, EmbedVideo, MessageActivity, MessageActivityKind,
    MessageApplication, MessageId, Reaction,
};
pub use role::{Role, RoleId};
pub use token::AuthToken;
pub use user::{User, UserConnection, UserId};

/// Base URL of the Discord CDN used for avatars, icons and emoji images.
pub const DISCORD_CDN: &str = "https://cdn.discordapp.com";
