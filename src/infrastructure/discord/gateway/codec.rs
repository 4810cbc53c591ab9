use chrono::DateTime;
use flate2::{Decompress, FlushDecompress, Status};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::constants::ZLIB_SUFFIX;
use super::error::{GatewayError, GatewayResult};
use super::events::{DispatchEvent, PresenceStatus};
use super::payloads::{
    GatewayPayload, GuildBanPayload, GuildMemberAddPayload, GuildMemberRemovePayload,
    HelloPayload, MessageDeleteBulkPayload, MessageDeletePayload, PresenceUpdatePayload,
    ReactionPayload, ReactionRemoveAllPayload, ReadyPayload, TypingStartPayload,
};

const INITIAL_OUTPUT_SIZE: usize = 32 * 1024;
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Inflates a `zlib-stream` transport: one zlib context shared by every
/// binary frame, with messages delimited by a sync-flush suffix.
pub struct GatewayCodec {
    inflater: Decompress,
    buffer: Vec<u8>,
}

impl GatewayCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
            buffer: Vec::with_capacity(4096),
        }
    }

    /// Buffers `data` and returns the inflated message once it is complete.
    pub fn decode_binary(&mut self, data: &[u8]) -> GatewayResult<Option<String>> {
        self.buffer.extend_from_slice(data);

        if !self.buffer.ends_with(&ZLIB_SUFFIX) {
            return Ok(None);
        }

        let inflated = self.inflate();
        self.buffer.clear();
        inflated.map(Some)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn inflate(&mut self) -> GatewayResult<String> {
        let mut output = Vec::with_capacity(INITIAL_OUTPUT_SIZE.max(self.buffer.len() * 4));
        let mut consumed = 0;

        loop {
            if output.len() == output.capacity() {
                if output.capacity() >= MAX_FRAME_SIZE {
                    return Err(GatewayError::compression(
                        "inflated frame exceeds maximum size",
                    ));
                }
                output.reserve(output.capacity());
            }

            let in_before = self.inflater.total_in();
            let out_before = self.inflater.total_out();

            let status = self
                .inflater
                .decompress_vec(&self.buffer[consumed..], &mut output, FlushDecompress::Sync)
                .map_err(|e| GatewayError::compression(e.to_string()))?;

            let read = (self.inflater.total_in() - in_before) as usize;
            let written = self.inflater.total_out() - out_before;
            consumed += read;

            let has_room = output.len() < output.capacity();
            let drained = consumed >= self.buffer.len() && has_room;
            let stalled = read == 0 && written == 0 && has_room;
            if drained || stalled || status == Status::StreamEnd {
                break;
            }
        }

        String::from_utf8(output)
            .map_err(|e| GatewayError::compression(format!("invalid UTF-8: {e}")))
    }

    /// Starts a fresh zlib context, for a new connection.
    pub fn reset(&mut self) {
        self.inflater.reset(true);
        self.buffer.clear();
    }
}

impl Default for GatewayCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<T: DeserializeOwned>(event_type: &str, data: Value) -> GatewayResult<T> {
    serde_json::from_value(data)
        .map_err(|e| GatewayError::decode(format!("failed to parse {event_type}: {e}")))
}

pub struct EventParser;

impl EventParser {
    /// Decodes one text frame into the generic envelope.
    pub fn parse_frame(json: &str) -> GatewayResult<GatewayPayload> {
        serde_json::from_str(json).map_err(|e| GatewayError::decode(e.to_string()))
    }

    pub fn parse_hello(data: &Value) -> GatewayResult<HelloPayload> {
        serde_json::from_value(data.clone())
            .map_err(|e| GatewayError::decode(format!("failed to parse HELLO: {e}")))
    }

    /// Decodes a dispatch payload by its event name. Names without a decoder
    /// yield [`DispatchEvent::Unknown`].
    pub fn parse_dispatch(event_type: &str, data: Value) -> GatewayResult<DispatchEvent> {
        let event = match event_type {
            "READY" => {
                let ready: ReadyPayload = decode(event_type, data)?;
                DispatchEvent::Ready {
                    session_id: ready.session_id,
                    user: ready.user,
                    guilds: ready.guilds,
                }
            }
            "RESUMED" => DispatchEvent::Resumed,

            "GUILD_CREATE" => DispatchEvent::GuildCreate(decode(event_type, data)?),
            "GUILD_UPDATE" => DispatchEvent::GuildUpdate(decode(event_type, data)?),
            "GUILD_DELETE" => DispatchEvent::GuildDelete(decode(event_type, data)?),
            "GUILD_BAN_ADD" => {
                let ban: GuildBanPayload = decode(event_type, data)?;
                DispatchEvent::GuildBanAdd {
                    guild_id: ban.guild_id,
                    user: ban.user,
                }
            }
            "GUILD_BAN_REMOVE" => {
                let ban: GuildBanPayload = decode(event_type, data)?;
                DispatchEvent::GuildBanRemove {
                    guild_id: ban.guild_id,
                    user: ban.user,
                }
            }
            "GUILD_MEMBER_ADD" => {
                let added: GuildMemberAddPayload = decode(event_type, data)?;
                DispatchEvent::GuildMemberAdd {
                    guild_id: added.guild_id,
                    member: added.member,
                }
            }
            "GUILD_MEMBER_REMOVE" => {
                let removed: GuildMemberRemovePayload = decode(event_type, data)?;
                DispatchEvent::GuildMemberRemove {
                    guild_id: removed.guild_id,
                    user: removed.user,
                }
            }

            "CHANNEL_CREATE" => DispatchEvent::ChannelCreate(decode(event_type, data)?),
            "CHANNEL_UPDATE" => DispatchEvent::ChannelUpdate(decode(event_type, data)?),
            "CHANNEL_DELETE" => DispatchEvent::ChannelDelete(decode(event_type, data)?),

            "MESSAGE_CREATE" => DispatchEvent::MessageCreate(decode(event_type, data)?),
            "MESSAGE_UPDATE" => DispatchEvent::MessageUpdate(decode(event_type, data)?),
            "MESSAGE_DELETE" => {
                let deleted: MessageDeletePayload = decode(event_type, data)?;
                DispatchEvent::MessageDelete {
                    message_id: deleted.id,
                    channel_id: deleted.channel_id,
                }
            }
            "MESSAGE_DELETE_BULK" => {
                let deleted: MessageDeleteBulkPayload = decode(event_type, data)?;
                DispatchEvent::MessageDeleteBulk {
                    message_ids: deleted.ids,
                    channel_id: deleted.channel_id,
                }
            }
            "MESSAGE_REACTION_ADD" => {
                let reaction: ReactionPayload = decode(event_type, data)?;
                DispatchEvent::MessageReactionAdd {
                    user_id: reaction.user_id,
                    channel_id: reaction.channel_id,
                    message_id: reaction.message_id,
                    emoji: reaction.emoji,
                }
            }
            "MESSAGE_REACTION_REMOVE" => {
                let reaction: ReactionPayload = decode(event_type, data)?;
                DispatchEvent::MessageReactionRemove {
                    user_id: reaction.user_id,
                    channel_id: reaction.channel_id,
                    message_id: reaction.message_id,
                    emoji: reaction.emoji,
                }
            }
            "MESSAGE_REACTION_REMOVE_ALL" => {
                let cleared: ReactionRemoveAllPayload = decode(event_type, data)?;
                DispatchEvent::MessageReactionRemoveAll {
                    channel_id: cleared.channel_id,
                    message_id: cleared.message_id,
                }
            }

            "TYPING_START" => {
                let typing: TypingStartPayload = decode(event_type, data)?;
                let timestamp = DateTime::from_timestamp(typing.timestamp, 0).ok_or_else(|| {
                    GatewayError::decode(format!(
                        "TYPING_START timestamp out of range: {}",
                        typing.timestamp
                    ))
                })?;
                DispatchEvent::TypingStart {
                    user_id: typing.user_id,
                    channel_id: typing.channel_id,
                    timestamp,
                }
            }
            "PRESENCE_UPDATE" => {
                let presence: PresenceUpdatePayload = decode(event_type, data)?;
                DispatchEvent::PresenceUpdate {
                    user_id: presence.user.id,
                    guild_id: presence.guild_id,
                    status: PresenceStatus::parse(&presence.status),
                    activity: presence.into_activity(),
                }
            }

            _ => DispatchEvent::Unknown {
                event_type: event_type.to_string(),
            },
        };

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChannelId, GuildId, MessageId, User, UserId};
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    #[test]
    fn test_codec_incomplete_message() {
        let mut codec = GatewayCodec::new();
        let result = codec.decode_binary(&[0x01, 0x02, 0x03]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_codec_inflates_shared_stream() {
        let first = r#"{"op":10,"d":{"heartbeat_interval":41250}}"#;
        let second = r#"{"op":11,"d":null}"#;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(first.as_bytes()).unwrap();
        encoder.flush().unwrap();
        let first_frame: Vec<u8> = encoder.get_mut().drain(..).collect();
        encoder.write_all(second.as_bytes()).unwrap();
        encoder.flush().unwrap();
        let second_frame: Vec<u8> = encoder.get_mut().drain(..).collect();

        let mut codec = GatewayCodec::new();
        let (head, tail) = first_frame.split_at(first_frame.len() / 2);
        assert!(codec.decode_binary(head).unwrap().is_none());
        assert_eq!(codec.decode_binary(tail).unwrap().as_deref(), Some(first));
        assert_eq!(
            codec.decode_binary(&second_frame).unwrap().as_deref(),
            Some(second)
        );
    }

    #[test]
    fn test_codec_reset() {
        let mut codec = GatewayCodec::new();
        codec.buffer.extend_from_slice(&[1, 2, 3]);
        codec.reset();
        assert!(codec.buffer.is_empty());
    }

    #[test]
    fn test_malformed_frame_is_decode_error() {
        let error = EventParser::parse_frame("{not json").unwrap_err();
        assert!(error.is_decode_error());
    }

    #[test]
    fn test_event_parser_unknown_event() {
        let result =
            EventParser::parse_dispatch("SOME_FUTURE_EVENT", serde_json::json!({})).unwrap();
        assert!(result.is_unknown());
    }

    #[test]
    fn test_missing_required_field_is_decode_error() {
        let result = EventParser::parse_dispatch(
            "MESSAGE_DELETE",
            serde_json::json!({"channel_id": "1"}),
        );
        assert!(result.unwrap_err().is_decode_error());
    }

    #[test]
    fn test_partial_message_update_is_delivered() {
        let result = EventParser::parse_dispatch(
            "MESSAGE_UPDATE",
            serde_json::json!({"id": "1", "channel_id": "2", "guild_id": "3", "embeds": []}),
        )
        .unwrap();

        let DispatchEvent::MessageUpdate(message) = result else {
            panic!("expected MessageUpdate, got {result:?}");
        };
        assert_eq!(message.id, MessageId(1));
        assert_eq!(message.channel_id, ChannelId(2));
        assert_eq!(message.guild_id, Some(GuildId(3)));
        assert_eq!(message.author, User::default());
        assert!(message.content.is_empty());
    }

    #[test]
    fn test_message_delete_positional_ids() {
        let result = EventParser::parse_dispatch(
            "MESSAGE_DELETE",
            serde_json::json!({"id": "10", "channel_id": "20", "guild_id": "30"}),
        )
        .unwrap();

        assert_eq!(
            result,
            DispatchEvent::MessageDelete {
                message_id: MessageId(10),
                channel_id: ChannelId(20),
            }
        );
    }

    #[test]
    fn test_parse_reaction_add() {
        let result = EventParser::parse_dispatch(
            "MESSAGE_REACTION_ADD",
            serde_json::json!({
                "user_id": "1",
                "channel_id": "2",
                "message_id": "3",
                "emoji": {"id": null, "name": "👍"}
            }),
        )
        .unwrap();

        match result {
            DispatchEvent::MessageReactionAdd {
                user_id,
                channel_id,
                message_id,
                emoji,
            } => {
                assert_eq!(user_id, UserId(1));
                assert_eq!(channel_id, ChannelId(2));
                assert_eq!(message_id, MessageId(3));
                assert_eq!(emoji.name.as_deref(), Some("👍"));
            }
            other => panic!("Expected MessageReactionAdd, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_typing_start() {
        let data = serde_json::json!({
            "channel_id": "123456789",
            "guild_id": "987654321",
            "user_id": "111222333",
            "timestamp": 1_234_567_890
        });
        let result = EventParser::parse_dispatch("TYPING_START", data).unwrap();
        match result {
            DispatchEvent::TypingStart {
                user_id,
                channel_id,
                timestamp,
            } => {
                assert_eq!(channel_id, ChannelId(123_456_789));
                assert_eq!(user_id, UserId(111_222_333));
                assert_eq!(timestamp.timestamp(), 1_234_567_890);
            }
            other => panic!("Expected TypingStart event, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_ready() {
        let data = serde_json::json!({
            "v": 6,
            "session_id": "abc123",
            "user": {"id": "42", "username": "bot", "discriminator": "0001", "bot": true},
            "guilds": [{"id": "7", "unavailable": true}],
            "private_channels": []
        });

        match EventParser::parse_dispatch("READY", data).unwrap() {
            DispatchEvent::Ready {
                session_id,
                user,
                guilds,
            } => {
                assert_eq!(session_id, "abc123");
                assert!(user.bot);
                assert_eq!(guilds[0].id, GuildId(7));
                assert!(guilds[0].unavailable);
            }
            other => panic!("Expected Ready, got {other:?}"),
        }
    }
}
