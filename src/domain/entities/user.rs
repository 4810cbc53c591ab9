//! Discord user entity.

use serde::{Deserialize, Serialize};

use super::DISCORD_CDN;

snowflake_id!(
    /// Unique identifier for a Discord user.
    UserId
);

/// A Discord user, either a regular account or a bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// The user's id.
    pub id: UserId,
    /// Not unique across the platform.
    #[serde(default)]
    pub username: String,
    /// The 4-digit tag, `"0"` for migrated accounts.
    #[serde(default)]
    pub discriminator: String,
    /// Avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Whether the user belongs to an OAuth2 application.
    #[serde(default)]
    pub bot: bool,
    /// Whether the user has two factor enabled.
    #[serde(default)]
    pub mfa_enabled: bool,
    /// Whether the email on this account has been verified.
    #[serde(default)]
    pub verified: bool,
    /// Only present with the `email` OAuth2 scope.
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(
        id: impl Into<UserId>,
        username: impl Into<String>,
        discriminator: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            discriminator: discriminator.into(),
            ..Self::default()
        }
    }

    /// Returns the CDN URL of the user's avatar, if one is set.
    #[must_use]
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{DISCORD_CDN}/avatars/{}/{hash}.png", self.id))
    }

    /// Returns the CDN URL of the default avatar derived from the discriminator.
    #[must_use]
    pub fn default_avatar_url(&self) -> String {
        let index = self.discriminator.parse::<u16>().unwrap_or(0) % 5;
        format!("{DISCORD_CDN}/embed/avatars/{index}.png")
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.username, self.discriminator)
    }
}

/// A third-party account connected to the current user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserConnection {
    pub id: String,
    pub name: String,
    /// Service of the connection (twitch, youtube, ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub integrations: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_decode() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "80351110224678912",
            "username": "Nelly",
            "discriminator": "1337",
            "avatar": "8342729096ea3675442027381ff50dfe",
            "verified": true,
            "email": "nelly@discord.com"
        }))
        .unwrap();

        assert_eq!(user.id, UserId(80_351_110_224_678_912));
        assert_eq!(user.to_string(), "Nelly#1337");
        assert!(user.verified);
        assert!(!user.bot);
    }

    #[test]
    fn test_avatar_urls() {
        let mut user = User::new(42_u64, "bot", "0007");
        assert!(user.avatar_url().is_none());
        assert_eq!(
            user.default_avatar_url(),
            "https://cdn.discordapp.com/embed/avatars/2.png"
        );

        user.avatar = Some("abc".into());
        assert_eq!(
            user.avatar_url().as_deref(),
            Some("https://cdn.discordapp.com/avatars/42/abc.png")
        );
    }

    #[test]
    fn test_user_id_from_str() {
        let id: UserId = "123456789".parse().unwrap();
        assert_eq!(id.as_u64(), 123_456_789);
        assert!("abc".parse::<UserId>().is_err());
    }
}
