//! Typed REST convenience calls.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::dto::{
    CreateChannelRequest, CreateMessageRequest, EditMessageRequest, GatewayBotResponse,
    GetMessagesQuery,
};
use super::http::HttpClient;
use crate::domain::entities::{
    Channel, ChannelId, ChannelMessage, Guild, GuildId, GuildMember, MessageId, User,
    UserConnection, UserId,
};
use crate::domain::errors::HttpError;
use crate::domain::ports::HttpMethod;

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, HttpError> {
    serde_json::to_value(value).map_err(|e| HttpError::invalid_request(e.to_string()))
}

/// Discord REST API client.
///
/// Cheap to clone; all clones share one transport and its rate-limit state.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    http: Arc<HttpClient>,
}

impl DiscordClient {
    #[must_use]
    pub const fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// The underlying transport, for endpoints without a typed wrapper.
    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Resolves the gateway URL and the recommended shard count.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_gateway_bot(&self) -> Result<GatewayBotResponse, HttpError> {
        let gateway: GatewayBotResponse = self
            .http
            .request_json(HttpMethod::Get, "/gateway/bot", None, Vec::new())
            .await?;
        debug!(url = %gateway.url, shards = gateway.shards, "Resolved gateway endpoint");
        Ok(gateway)
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, HttpError> {
        self.http
            .request_json(HttpMethod::Get, &format!("/users/{user_id}"), None, Vec::new())
            .await
    }

    /// Returns the bot's own user.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_current_user(&self) -> Result<User, HttpError> {
        self.http
            .request_json(HttpMethod::Get, "/users/@me", None, Vec::new())
            .await
    }

    /// Partial guilds the bot is a member of.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_current_user_guilds(&self) -> Result<Vec<Guild>, HttpError> {
        self.http
            .request_json(HttpMethod::Get, "/users/@me/guilds", None, Vec::new())
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_guild(&self, guild_id: GuildId) -> Result<Guild, HttpError> {
        self.http
            .request_json(HttpMethod::Get, &format!("/guilds/{guild_id}"), None, Vec::new())
            .await
    }

    /// Lists guild members; the API returns one member when `limit` is unset.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_guild_members(
        &self,
        guild_id: GuildId,
        limit: Option<u16>,
    ) -> Result<Vec<GuildMember>, HttpError> {
        let query = limit
            .map(|limit| vec![("limit".to_string(), limit.clamp(1, 1000).to_string())])
            .unwrap_or_default();
        self.http
            .request_json(
                HttpMethod::Get,
                &format!("/guilds/{guild_id}/members"),
                None,
                query,
            )
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_guild_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<GuildMember, HttpError> {
        self.http
            .request_json(
                HttpMethod::Get,
                &format!("/guilds/{guild_id}/members/{user_id}"),
                None,
                Vec::new(),
            )
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_guild_channels(&self, guild_id: GuildId) -> Result<Vec<Channel>, HttpError> {
        self.http
            .request_json(
                HttpMethod::Get,
                &format!("/guilds/{guild_id}/channels"),
                None,
                Vec::new(),
            )
            .await
    }

    /// Creates a guild channel.
    ///
    /// # Errors
    /// Returns `InvalidRequest` without contacting the API when the name is
    /// blank, otherwise any error of the request.
    pub async fn create_guild_channel(
        &self,
        guild_id: GuildId,
        request: &CreateChannelRequest,
    ) -> Result<Channel, HttpError> {
        if request.name.trim().is_empty() {
            return Err(HttpError::invalid_request(
                "channel name must be set when creating a guild channel",
            ));
        }

        self.http
            .request_json(
                HttpMethod::Post,
                &format!("/guilds/{guild_id}/channels"),
                Some(to_body(request)?),
                Vec::new(),
            )
            .await
    }

    /// Deletes a guild. The bot must own it.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_guild(&self, guild_id: GuildId) -> Result<(), HttpError> {
        self.http
            .request(HttpMethod::Delete, &format!("/guilds/{guild_id}"), None, Vec::new())
            .await
            .map(drop)
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn leave_guild(&self, guild_id: GuildId) -> Result<(), HttpError> {
        self.http
            .request(
                HttpMethod::Delete,
                &format!("/users/@me/guilds/{guild_id}"),
                None,
                Vec::new(),
            )
            .await
            .map(drop)
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_channel(&self, channel_id: ChannelId) -> Result<Channel, HttpError> {
        self.http
            .request_json(HttpMethod::Get, &format!("/channels/{channel_id}"), None, Vec::new())
            .await
    }

    /// Deletes a guild channel or closes a DM. Returns the deleted channel.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_channel(&self, channel_id: ChannelId) -> Result<Channel, HttpError> {
        self.http
            .request_json(
                HttpMethod::Delete,
                &format!("/channels/{channel_id}"),
                None,
                Vec::new(),
            )
            .await
    }

    /// Open DM channels of the bot.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_dms(&self) -> Result<Vec<Channel>, HttpError> {
        self.http
            .request_json(HttpMethod::Get, "/users/@me/channels", None, Vec::new())
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_connections(&self) -> Result<Vec<UserConnection>, HttpError> {
        self.http
            .request_json(HttpMethod::Get, "/users/@me/connections", None, Vec::new())
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_messages(
        &self,
        channel_id: ChannelId,
        query: &GetMessagesQuery,
    ) -> Result<Vec<ChannelMessage>, HttpError> {
        self.http
            .request_json(
                HttpMethod::Get,
                &format!("/channels/{channel_id}/messages"),
                None,
                query.to_query(),
            )
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<ChannelMessage, HttpError> {
        self.http
            .request_json(
                HttpMethod::Get,
                &format!("/channels/{channel_id}/messages/{message_id}"),
                None,
                Vec::new(),
            )
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn create_message(
        &self,
        channel_id: ChannelId,
        request: &CreateMessageRequest,
    ) -> Result<ChannelMessage, HttpError> {
        debug!(channel_id = %channel_id, "Sending message");
        self.http
            .request_json(
                HttpMethod::Post,
                &format!("/channels/{channel_id}/messages"),
                Some(to_body(request)?),
                Vec::new(),
            )
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        request: &EditMessageRequest,
    ) -> Result<ChannelMessage, HttpError> {
        self.http
            .request_json(
                HttpMethod::Patch,
                &format!("/channels/{channel_id}/messages/{message_id}"),
                Some(to_body(request)?),
                Vec::new(),
            )
            .await
    }

    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), HttpError> {
        self.http
            .request(
                HttpMethod::Delete,
                &format!("/channels/{channel_id}/messages/{message_id}"),
                None,
                Vec::new(),
            )
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AuthToken;
    use crate::domain::ports::HttpResponse;
    use crate::domain::ports::mocks::MockHttpBackend;

    fn client(backend: MockHttpBackend) -> DiscordClient {
        DiscordClient::new(Arc::new(HttpClient::new(
            Arc::new(backend),
            "https://discord.test/api",
            AuthToken::new("token").unwrap(),
        )))
    }

    #[tokio::test]
    async fn test_create_guild_channel_rejects_blank_name() {
        let mut backend = MockHttpBackend::new();
        backend.expect_execute().never();

        let result = client(backend)
            .create_guild_channel(GuildId(1), &CreateChannelRequest::new("  "))
            .await;

        assert!(matches!(result, Err(HttpError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_create_message_posts_json_body() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Post
                    && request.url == "https://discord.test/api/channels/10/messages"
                    && request.body == Some(serde_json::json!({"content": "pong"}))
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"id": "11", "channel_id": "10", "content": "pong",
                        "timestamp": "2018-01-01T00:00:00+00:00",
                        "author": {"id": "3", "username": "bot", "discriminator": "0001", "bot": true}}"#,
                ))
            });

        let message = client(backend)
            .create_message(ChannelId(10), &CreateMessageRequest::new("pong"))
            .await
            .unwrap();

        assert_eq!(message.id, MessageId(11));
        assert!(message.author.bot);
    }

    #[tokio::test]
    async fn test_leave_guild_uses_current_user_path() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Delete
                    && request.url == "https://discord.test/api/users/@me/guilds/99"
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(204, Vec::new())));

        client(backend).leave_guild(GuildId(99)).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_gateway_bot() {
        let mut backend = MockHttpBackend::new();
        backend.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"url": "wss://gateway.discord.gg", "shards": 2}"#,
            ))
        });

        let gateway = client(backend).get_gateway_bot().await.unwrap();

        assert_eq!(gateway.url, "wss://gateway.discord.gg");
        assert_eq!(gateway.shards, 2);
    }

    #[tokio::test]
    async fn test_empty_body_for_typed_call_is_decode_error() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, Vec::new())));

        let result = client(backend).get_user(UserId(5)).await;

        assert!(matches!(result, Err(HttpError::Decode { .. })));
    }
}
