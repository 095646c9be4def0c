//! Capability levels consumed by the command layer.

use std::fmt;

/// What a Discord user may do on the platform.
///
/// Ordered so that a higher capability includes every lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    User,
    Moderator,
    Admin,
}

impl Capability {
    /// Value stored in the `admin_role.level` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "moderator" | "mod" => Some(Self::Moderator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Discord role granted a capability within one Discord guild.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleGrant {
    pub guild_id: u64,
    pub role_id: u64,
    pub level: Capability,
}
