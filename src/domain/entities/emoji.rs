//! Custom and unicode emoji.

use serde::{Deserialize, Serialize};

use super::{DISCORD_CDN, RoleId, User};

snowflake_id!(
    /// Unique identifier for a custom emoji.
    EmojiId
);

/// An emoji. Unicode emoji carry a name but no id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Emoji {
    #[serde(default)]
    pub id: Option<EmojiId>,
    #[serde(default)]
    pub name: Option<String>,
    /// Roles this emoji is whitelisted to.
    #[serde(default)]
    pub roles: Vec<RoleId>,
    /// User that created this emoji.
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub require_colons: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub animated: bool,
}

impl Emoji {
    /// CDN image URL; `None` for unicode emoji.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        let extension = if self.animated { "gif" } else { "png" };
        self.id
            .map(|id| format!("{DISCORD_CDN}/emojis/{id}.{extension}"))
    }

    /// Returns the form used in message content and reaction routes.
    #[must_use]
    pub fn mention(&self) -> String {
        let name = self.name.as_deref().unwrap_or_default();
        match self.id {
            Some(id) if self.animated => format!("<a:{name}:{id}>"),
            Some(id) => format!("<:{name}:{id}>"),
            None => name.to_string(),
        }
    }
}
