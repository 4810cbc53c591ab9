use serde::{Deserialize, Serialize};

snowflake_id!(
    /// Unique identifier for a guild role.
    RoleId
);

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Integer representation of the hexadecimal color code.
    #[serde(default)]
    pub color: u32,
    /// Whether the role is pinned in the user listing.
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i32,
    #[serde(default, deserialize_with = "crate::domain::serde_utils::lenient_u64::deserialize")]
    pub permissions: u64,
    /// Whether the role is managed by an integration.
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
