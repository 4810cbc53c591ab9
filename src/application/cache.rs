//! State captured from `READY` and kept current by guild events.

use parking_lot::RwLock;

use crate::domain::entities::{Guild, GuildId, User};

#[derive(Debug, Default)]
pub struct ReadyCache {
    user: RwLock<Option<User>>,
    guilds: RwLock<Vec<Guild>>,
}

impl ReadyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached state with a fresh `READY` payload.
    pub fn store_ready(&self, user: User, guilds: Vec<Guild>) {
        *self.user.write() = Some(user);
        *self.guilds.write() = guilds;
    }

    /// Inserts a guild, replacing the entry (or `READY` stub) with its id.
    pub fn upsert_guild(&self, guild: Guild) {
        let mut guilds = self.guilds.write();
        match guilds.iter_mut().find(|g| g.id == guild.id) {
            Some(existing) => *existing = guild,
            None => guilds.push(guild),
        }
    }

    pub fn remove_guild(&self, guild_id: GuildId) {
        self.guilds.write().retain(|g| g.id != guild_id);
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    #[must_use]
    pub fn guilds(&self) -> Vec<Guild> {
        self.guilds.read().clone()
    }
}
