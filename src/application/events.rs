//! Public event catalogue delivered to handlers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::entities::{
    Activity, Channel, ChannelId, ChannelMessage, Emoji, Guild, GuildId, GuildMember, MessageId,
    User, UserId,
};
use crate::domain::errors::RegistrationError;
use crate::infrastructure::discord::{DispatchEvent, PresenceStatus};

macro_rules! event_names {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Handler slot an event is delivered to.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventName {
            $($variant,)+
        }

        impl EventName {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// The name handlers are registered under, e.g. `on_message`.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl FromStr for EventName {
            type Err = RegistrationError;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(RegistrationError::UnknownEvent {
                        name: name.to_string(),
                    }),
                }
            }
        }
    };
}

event_names! {
    Ready => "on_ready",
    Resumed => "on_resumed",
    GuildCreate => "on_guild_create",
    GuildUpdate => "on_guild_update",
    GuildDelete => "on_guild_delete",
    Ban => "on_ban",
    BanRemove => "on_ban_remove",
    MemberJoin => "on_member_join",
    MemberRemove => "on_member_remove",
    ChannelCreate => "on_channel_create",
    ChannelUpdate => "on_channel_update",
    ChannelDelete => "on_channel_delete",
    Message => "on_message",
    MessageUpdate => "on_message_update",
    MessageDelete => "on_message_delete",
    MessageDeleteBulk => "on_message_delete_bulk",
    MessageReactionAdd => "on_message_reaction_add",
    MessageReactionRemove => "on_message_reaction_remove",
    MessageReactionRemoveAll => "on_message_reaction_remove_all",
    TypingStart => "on_typing_start",
    PresenceUpdate => "on_presence_update",
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event as handed to a handler.
///
/// Variants carry the handler's positional arguments. Single-record events
/// carry the record; the rest carry ids and records side by side, in wire
/// order.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum Event {
    /// The own user and guild list are in the bot's cache by the time this
    /// is delivered.
    Ready,
    Resumed,
    GuildCreate(Guild),
    GuildUpdate(Guild),
    GuildDelete(Guild),
    Ban(GuildId, User),
    BanRemove(GuildId, User),
    MemberJoin(GuildId, GuildMember),
    MemberRemove(GuildId, User),
    ChannelCreate(Channel),
    ChannelUpdate(Channel),
    ChannelDelete(Channel),
    Message(ChannelMessage),
    MessageUpdate(ChannelMessage),
    MessageDelete(MessageId, ChannelId),
    MessageDeleteBulk(Vec<MessageId>, ChannelId),
    MessageReactionAdd(UserId, ChannelId, MessageId, Emoji),
    MessageReactionRemove(UserId, ChannelId, MessageId, Emoji),
    MessageReactionRemoveAll(ChannelId, MessageId),
    TypingStart(UserId, ChannelId, DateTime<Utc>),
    PresenceUpdate(UserId, Option<GuildId>, PresenceStatus, Option<Activity>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> EventName {
        match self {
            Self::Ready => EventName::Ready,
            Self::Resumed => EventName::Resumed,
            Self::GuildCreate(_) => EventName::GuildCreate,
            Self::GuildUpdate(_) => EventName::GuildUpdate,
            Self::GuildDelete(_) => EventName::GuildDelete,
            Self::Ban(..) => EventName::Ban,
            Self::BanRemove(..) => EventName::BanRemove,
            Self::MemberJoin(..) => EventName::MemberJoin,
            Self::MemberRemove(..) => EventName::MemberRemove,
            Self::ChannelCreate(_) => EventName::ChannelCreate,
            Self::ChannelUpdate(_) => EventName::ChannelUpdate,
            Self::ChannelDelete(_) => EventName::ChannelDelete,
            Self::Message(_) => EventName::Message,
            Self::MessageUpdate(_) => EventName::MessageUpdate,
            Self::MessageDelete(..) => EventName::MessageDelete,
            Self::MessageDeleteBulk(..) => EventName::MessageDeleteBulk,
            Self::MessageReactionAdd(..) => EventName::MessageReactionAdd,
            Self::MessageReactionRemove(..) => EventName::MessageReactionRemove,
            Self::MessageReactionRemoveAll(..) => EventName::MessageReactionRemoveAll,
            Self::TypingStart(..) => EventName::TypingStart,
            Self::PresenceUpdate(..) => EventName::PresenceUpdate,
        }
    }
}

impl TryFrom<DispatchEvent> for Event {
    /// Events with no handler slot are handed back.
    type Error = DispatchEvent;

    fn try_from(event: DispatchEvent) -> Result<Self, Self::Error> {
        Ok(match event {
            DispatchEvent::Ready { .. } => Self::Ready,
            DispatchEvent::Resumed => Self::Resumed,
            DispatchEvent::GuildCreate(guild) => Self::GuildCreate(guild),
            DispatchEvent::GuildUpdate(guild) => Self::GuildUpdate(guild),
            DispatchEvent::GuildDelete(guild) => Self::GuildDelete(guild),
            DispatchEvent::GuildBanAdd { guild_id, user } => Self::Ban(guild_id, user),
            DispatchEvent::GuildBanRemove { guild_id, user } => Self::BanRemove(guild_id, user),
            DispatchEvent::GuildMemberAdd { guild_id, member } => Self::MemberJoin(guild_id, member),
            DispatchEvent::GuildMemberRemove { guild_id, user } => {
                Self::MemberRemove(guild_id, user)
            }
            DispatchEvent::ChannelCreate(channel) => Self::ChannelCreate(channel),
            DispatchEvent::ChannelUpdate(channel) => Self::ChannelUpdate(channel),
            DispatchEvent::ChannelDelete(channel) => Self::ChannelDelete(channel),
            DispatchEvent::MessageCreate(message) => Self::Message(message),
            DispatchEvent::MessageUpdate(message) => Self::MessageUpdate(message),
            DispatchEvent::MessageDelete {
                message_id,
                channel_id,
            } => Self::MessageDelete(message_id, channel_id),
            DispatchEvent::MessageDeleteBulk {
                message_ids,
                channel_id,
            } => Self::MessageDeleteBulk(message_ids, channel_id),
            DispatchEvent::MessageReactionAdd {
                user_id,
                channel_id,
                message_id,
                emoji,
            } => Self::MessageReactionAdd(user_id, channel_id, message_id, emoji),
            DispatchEvent::MessageReactionRemove {
                user_id,
                channel_id,
                message_id,
                emoji,
            } => Self::MessageReactionRemove(user_id, channel_id, message_id, emoji),
            DispatchEvent::MessageReactionRemoveAll {
                channel_id,
                message_id,
            } => Self::MessageReactionRemoveAll(channel_id, message_id),
            DispatchEvent::TypingStart {
                user_id,
                channel_id,
                timestamp,
            } => Self::TypingStart(user_id, channel_id, timestamp),
            DispatchEvent::PresenceUpdate {
                user_id,
                guild_id,
                status,
                activity,
            } => Self::PresenceUpdate(user_id, guild_id, status, activity),
            unknown @ DispatchEvent::Unknown { .. } => return Err(unknown),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("on_ready", EventName::Ready ; "ready")]
    #[test_case("on_message", EventName::Message ; "message")]
    #[test_case("on_ban", EventName::Ban ; "ban")]
    #[test_case("on_member_join", EventName::MemberJoin ; "member_join")]
    #[test_case("on_message_reaction_remove_all", EventName::MessageReactionRemoveAll ; "reaction_remove_all")]
    fn test_handler_name_parses(name: &str, expected: EventName) {
        assert_eq!(name.parse::<EventName>().unwrap(), expected);
        assert_eq!(expected.as_str(), name);
    }

    #[test_case("on_mesage" ; "misspelled")]
    #[test_case("MESSAGE_CREATE" ; "gateway_tag")]
    #[test_case("" ; "empty")]
    fn test_unknown_handler_name(name: &str) {
        assert_eq!(
            name.parse::<EventName>(),
            Err(RegistrationError::UnknownEvent {
                name: name.to_string()
            })
        );
    }

    #[test]
    fn test_names_are_unique() {
        for name in EventName::ALL {
            assert_eq!(name.as_str().parse::<EventName>().unwrap(), *name);
        }
    }

    #[test]
    fn test_message_delete_keeps_positional_ids() {
        let event = Event::try_from(DispatchEvent::MessageDelete {
            message_id: MessageId(5),
            channel_id: ChannelId(6),
        })
        .unwrap();

        assert_eq!(event, Event::MessageDelete(MessageId(5), ChannelId(6)));
        assert_eq!(event.name(), EventName::MessageDelete);
    }

    #[test]
    fn test_ready_drops_its_payload() {
        let event = Event::try_from(DispatchEvent::Ready {
            session_id: "sess".into(),
            user: User::default(),
            guilds: Vec::new(),
        })
        .unwrap();

        assert_eq!(event, Event::Ready);
    }

    #[test]
    fn test_unknown_dispatch_has_no_slot() {
        let unknown = DispatchEvent::Unknown {
            event_type: "VOICE_STATE_UPDATE".into(),
        };

        assert_eq!(Event::try_from(unknown.clone()), Err(unknown));
    }
}
