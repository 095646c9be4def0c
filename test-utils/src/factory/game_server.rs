//! Game server factory for creating test server records.

use crate::factory::helpers::next_id;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating game servers with customizable fields.
///
/// # Example
///
/// ```rust,ignore
/// let server = GameServerFactory::new(&db, &user.discord_id)
///     .name("box1")
///     .status("stopped")
///     .stopped_at(Some(Utc::now()))
///     .build()
///     .await?;
/// ```
pub struct GameServerFactory<'a> {
    db: &'a DatabaseConnection,
    owner_id: String,
    guild_id: Option<String>,
    name: String,
    game_type: String,
    status: String,
    cost_per_hour: i64,
    external_id: Option<String>,
    is_public: bool,
    stopped_at: Option<DateTime<Utc>>,
    last_billed_at: DateTime<Utc>,
}

impl<'a> GameServerFactory<'a> {
    /// Creates a new GameServerFactory with default values.
    ///
    /// Defaults:
    /// - name: `"server-{id}"`
    /// - game_type: `"minecraft"`
    /// - status: `"creating"`
    /// - cost_per_hour: `5`
    /// - last_billed_at: now
    pub fn new(db: &'a DatabaseConnection, owner_id: impl Into<String>) -> Self {
        Self {
            db,
            owner_id: owner_id.into(),
            guild_id: None,
            name: format!("server-{}", next_id()),
            game_type: "minecraft".to_string(),
            status: "creating".to_string(),
            cost_per_hour: 5,
            external_id: None,
            is_public: false,
            stopped_at: None,
            last_billed_at: Utc::now(),
        }
    }

    /// Sets the server name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the game type.
    pub fn game_type(mut self, game_type: impl Into<String>) -> Self {
        self.game_type = game_type.into();
        self
    }

    /// Sets the stored status string.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the frozen hourly cost.
    pub fn cost_per_hour(mut self, cost_per_hour: i64) -> Self {
        self.cost_per_hour = cost_per_hour;
        self
    }

    /// Sets the funding guild.
    pub fn guild_id(mut self, guild_id: Option<String>) -> Self {
        self.guild_id = guild_id;
        self
    }

    /// Sets the orchestrator identifier.
    pub fn external_id(mut self, external_id: Option<String>) -> Self {
        self.external_id = external_id;
        self
    }

    /// Sets the public-lobby flag.
    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Sets when the server was stopped.
    pub fn stopped_at(mut self, stopped_at: Option<DateTime<Utc>>) -> Self {
        self.stopped_at = stopped_at;
        self
    }

    /// Sets the billing watermark.
    pub fn last_billed_at(mut self, last_billed_at: DateTime<Utc>) -> Self {
        self.last_billed_at = last_billed_at;
        self
    }

    /// Builds and inserts the game server entity into the database.
    pub async fn build(self) -> Result<entity::game_server::Model, DbErr> {
        entity::game_server::ActiveModel {
            id: ActiveValue::NotSet,
            owner_id: ActiveValue::Set(self.owner_id),
            guild_id: ActiveValue::Set(self.guild_id),
            name: ActiveValue::Set(self.name),
            game_type: ActiveValue::Set(self.game_type),
            status: ActiveValue::Set(self.status),
            cost_per_hour: ActiveValue::Set(self.cost_per_hour),
            external_id: ActiveValue::Set(self.external_id),
            address: ActiveValue::Set(None),
            port: ActiveValue::Set(None),
            is_public: ActiveValue::Set(self.is_public),
            error_message: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now()),
            stopped_at: ActiveValue::Set(self.stopped_at),
            last_billed_at: ActiveValue::Set(self.last_billed_at),
        }
        .insert(self.db)
        .await
    }
}

/// Creates a game server in the given status for the owner.
pub async fn create_server(
    db: &DatabaseConnection,
    owner_id: impl Into<String>,
    status: impl Into<String>,
) -> Result<entity::game_server::Model, DbErr> {
    GameServerFactory::new(db, owner_id)
        .status(status)
        .build()
        .await
}
