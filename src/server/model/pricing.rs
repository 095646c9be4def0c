//! Pricing catalog domain models.

use chrono::{DateTime, Utc};

/// Hourly pricing of a game type.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingEntry {
    /// Lowercase game type key.
    pub game_type: String,
    pub display_name: String,
    pub description: String,
    pub cost_per_hour: i64,
    /// Balance required before a server of this type can be created.
    pub min_credits: i64,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl PricingEntry {
    /// Converts an entity model to a pricing domain model at the repository boundary.
    pub fn from_entity(entity: entity::pricing::Model) -> Self {
        Self {
            game_type: entity.game_type,
            display_name: entity.display_name,
            description: entity.description,
            cost_per_hour: entity.cost_per_hour,
            min_credits: entity.min_credits,
            is_active: entity.is_active,
            updated_at: entity.updated_at,
        }
    }

    /// Balance a user needs to create a server of this type.
    pub fn required_balance(&self) -> i64 {
        self.cost_per_hour.max(self.min_credits)
    }
}

/// Parameters for adding a game type to the catalog.
#[derive(Debug, Clone)]
pub struct AddGameTypeParam {
    pub game_type: String,
    pub display_name: String,
    pub description: String,
    pub cost_per_hour: i64,
    pub min_credits: i64,
}

/// Normalizes a game type key for storage and lookup.
pub fn normalize_game_type(game_type: &str) -> String {
    game_type.trim().to_ascii_lowercase()
}

/// Catalog inserted when the pricing table is empty at startup.
pub fn default_catalog() -> Vec<AddGameTypeParam> {
    [
        ("minecraft", "Minecraft", "Java edition survival server", 5),
        ("cs2", "Counter-Strike 2", "Competitive CS2 dedicated server", 8),
        ("terraria", "Terraria", "Terraria world server", 3),
        ("gmod", "Garry's Mod", "Sandbox server", 6),
    ]
    .into_iter()
    .map(|(game_type, display_name, description, cost)| AddGameTypeParam {
        game_type: game_type.to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        cost_per_hour: cost,
        min_credits: cost,
    })
    .collect()
}
