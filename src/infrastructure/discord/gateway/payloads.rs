use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::{
    CLIENT_PROPERTIES_BROWSER, CLIENT_PROPERTIES_DEVICE, GatewayOpcode, client_os,
};
use crate::domain::entities::{
    Activity, ChannelId, Emoji, Guild, GuildId, GuildMember, MessageId, User, UserId,
};

/// Frame envelope, in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    fn new(opcode: GatewayOpcode, d: Value) -> Self {
        Self {
            op: opcode.as_u8(),
            d,
            s: None,
            t: None,
        }
    }

    #[must_use]
    pub fn heartbeat(sequence: Option<u64>) -> Self {
        Self::new(
            GatewayOpcode::Heartbeat,
            sequence.map_or(Value::Null, |s| Value::Number(s.into())),
        )
    }

    /// Fresh handshake. Payload compression is always off; transport
    /// compression is negotiated through the URL instead.
    #[must_use]
    pub fn identify(token: &str, large_threshold: u32) -> Self {
        let identify = IdentifyData {
            token: token.to_string(),
            properties: IdentifyProperties {
                os: client_os().to_string(),
                browser: CLIENT_PROPERTIES_BROWSER.to_string(),
                device: CLIENT_PROPERTIES_DEVICE.to_string(),
            },
            compress: false,
            large_threshold,
        };

        Self::new(
            GatewayOpcode::Identify,
            serde_json::to_value(identify).unwrap_or(Value::Null),
        )
    }

    #[must_use]
    pub fn resume(token: &str, session_id: &str, sequence: u64) -> Self {
        let resume = ResumeData {
            token: token.to_string(),
            session_id: session_id.to_string(),
            seq: sequence,
        };

        Self::new(
            GatewayOpcode::Resume,
            serde_json::to_value(resume).unwrap_or(Value::Null),
        )
    }

    #[must_use]
    pub const fn opcode(&self) -> Option<GatewayOpcode> {
        GatewayOpcode::from_u8(self.op)
    }
}

#[derive(Debug, Serialize)]
struct IdentifyData {
    token: String,
    properties: IdentifyProperties,
    compress: bool,
    large_threshold: u32,
}

#[derive(Debug, Serialize)]
struct IdentifyProperties {
    #[serde(rename = "$os")]
    os: String,
    #[serde(rename = "$browser")]
    browser: String,
    #[serde(rename = "$device")]
    device: String,
}

#[derive(Debug, Serialize)]
struct ResumeData {
    token: String,
    session_id: String,
    seq: u64,
}

#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    /// Milliseconds.
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub user: User,
    /// Unavailable stubs, completed by later `GUILD_CREATE` events.
    #[serde(default)]
    pub guilds: Vec<Guild>,
}

#[derive(Debug, Deserialize)]
pub struct GuildBanPayload {
    pub guild_id: GuildId,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct GuildMemberAddPayload {
    pub guild_id: GuildId,
    #[serde(flatten)]
    pub member: GuildMember,
}

#[derive(Debug, Deserialize)]
pub struct GuildMemberRemovePayload {
    pub guild_id: GuildId,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct MessageDeletePayload {
    pub id: MessageId,
    pub channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
pub struct MessageDeleteBulkPayload {
    pub ids: Vec<MessageId>,
    pub channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
pub struct ReactionPayload {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub emoji: Emoji,
}

#[derive(Debug, Deserialize)]
pub struct ReactionRemoveAllPayload {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

#[derive(Debug, Deserialize)]
pub struct TypingStartPayload {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    /// Unix time in seconds.
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
pub struct PresenceUserPayload {
    pub id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct PresenceUpdatePayload {
    pub user: PresenceUserPayload,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub game: Option<Activity>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl PresenceUpdatePayload {
    /// The current activity, from `game` or the first of `activities`.
    #[must_use]
    pub fn into_activity(self) -> Option<Activity> {
        self.game.or_else(|| self.activities.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_payload() {
        let payload = GatewayPayload::heartbeat(Some(42));
        assert_eq!(payload.op, 1);
        assert_eq!(payload.d, Value::Number(42.into()));
    }

    #[test]
    fn test_heartbeat_null_sequence() {
        let payload = GatewayPayload::heartbeat(None);
        assert_eq!(payload.d, Value::Null);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"op":1,"d":null}"#
        );
    }

    #[test]
    fn test_identify_survives_envelope_roundtrip() {
        let encoded = serde_json::to_string(&GatewayPayload::identify("test_token", 250)).unwrap();
        let decoded: GatewayPayload = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.opcode(), Some(GatewayOpcode::Identify));
        assert_eq!(decoded.d["token"], "test_token");
        assert_eq!(decoded.d["compress"], false);
        assert_eq!(decoded.d["large_threshold"], 250);
        assert_eq!(decoded.d["properties"]["$os"], client_os());
        assert_eq!(decoded.d["properties"]["$browser"], CLIENT_PROPERTIES_BROWSER);
        assert!(decoded.s.is_none());
    }

    #[test]
    fn test_resume_payload() {
        let payload = GatewayPayload::resume("token", "session123", 100);
        assert_eq!(payload.op, 6);

        let obj = payload.d.as_object().unwrap();
        assert_eq!(obj.get("session_id").unwrap(), "session123");
        assert_eq!(obj.get("seq").unwrap(), 100);
        assert_eq!(obj.get("token").unwrap(), "token");
    }

    #[test]
    fn test_member_add_flattens_member() {
        let payload: GuildMemberAddPayload = serde_json::from_value(serde_json::json!({
            "guild_id": "5",
            "user": {"id": "6", "username": "new", "discriminator": "0420"},
            "nick": "newbie",
            "roles": [],
            "joined_at": "2018-01-01T00:00:00+00:00"
        }))
        .unwrap();

        assert_eq!(payload.guild_id, GuildId(5));
        assert_eq!(payload.member.nick.as_deref(), Some("newbie"));
        assert_eq!(payload.member.user.id, UserId(6));
    }

    #[test]
    fn test_presence_prefers_game() {
        let payload: PresenceUpdatePayload = serde_json::from_value(serde_json::json!({
            "user": {"id": "1"},
            "status": "online",
            "game": {"name": "chess", "type": 0},
            "activities": [{"name": "go", "type": 0}]
        }))
        .unwrap();

        assert_eq!(payload.into_activity().map(|a| a.name).as_deref(), Some("chess"));
    }
}
