//! Pricing catalog service.
//!
//! Reads never cache: every lookup goes to the `pricing` table so an admin update takes
//! effect for the next server creation. Existing servers keep the hourly cost frozen on
//! their own record.

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink},
    data::{is_unique_violation, pricing::PricingRepository},
    error::{pricing::PricingError, AppError},
    model::pricing::{default_catalog, normalize_game_type, AddGameTypeParam, PricingEntry},
};

pub struct PricingService<'a> {
    db: &'a DatabaseConnection,
    audit: &'a dyn AuditSink,
}

impl<'a> PricingService<'a> {
    pub fn new(db: &'a DatabaseConnection, audit: &'a dyn AuditSink) -> Self {
        Self { db, audit }
    }

    /// Active pricing for a game type, case-insensitively.
    ///
    /// # Returns
    /// - `Ok(PricingEntry)` - The active entry
    /// - `Err(AppError::NotFound)` - Unknown or disabled game type
    pub async fn get_pricing(&self, game_type: &str) -> Result<PricingEntry, AppError> {
        let game_type = normalize_game_type(game_type);

        PricingRepository::new(self.db)
            .find(&game_type)
            .await?
            .filter(|entry| entry.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Unknown game type '{}'", game_type)))
    }

    /// Every catalog entry, including disabled ones.
    pub async fn get_all_pricing(&self) -> Result<Vec<PricingEntry>, AppError> {
        PricingRepository::new(self.db).list(false).await
    }

    /// Entries users can create servers for.
    pub async fn list_catalog(&self) -> Result<Vec<PricingEntry>, AppError> {
        PricingRepository::new(self.db).list(true).await
    }

    pub async fn is_valid_game_type(&self, game_type: &str) -> Result<bool, AppError> {
        match self.get_pricing(game_type).await {
            Ok(_) => Ok(true),
            Err(AppError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Changes the price of an existing game type.
    ///
    /// # Returns
    /// - `Ok(PricingEntry)` - Updated entry
    /// - `Err(AppError::PricingErr(InvalidPrice))` - Cost is not positive or the minimum
    ///   is negative
    /// - `Err(AppError::NotFound)` - Unknown game type
    pub async fn update_pricing(
        &self,
        actor: u64,
        game_type: &str,
        cost_per_hour: i64,
        min_credits: i64,
    ) -> Result<PricingEntry, AppError> {
        validate_price(cost_per_hour, min_credits)?;

        let game_type = normalize_game_type(game_type);
        let repo = PricingRepository::new(self.db);
        let before = repo
            .find(&game_type)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown game type '{}'", game_type)))?;

        if !repo
            .update_price(&game_type, cost_per_hour, min_credits, Utc::now())
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Unknown game type '{}'",
                game_type
            )));
        }

        self.audit.record(
            AuditEvent::new(AuditChannel::Mod, "pricing.update", format!("game:{}", game_type))
                .actor(actor)
                .detail("cost_before", before.cost_per_hour)
                .detail("cost_after", cost_per_hour)
                .detail("min_before", before.min_credits)
                .detail("min_after", min_credits),
        );

        self.find_required(&game_type).await
    }

    /// Adds a new, active game type.
    ///
    /// # Returns
    /// - `Ok(PricingEntry)` - The inserted entry
    /// - `Err(AppError::PricingErr(AlreadyExists))` - The key is taken, active or not
    /// - `Err(AppError::PricingErr(InvalidPrice))` - Invalid cost or minimum
    pub async fn add_game_type(
        &self,
        actor: u64,
        mut param: AddGameTypeParam,
    ) -> Result<PricingEntry, AppError> {
        validate_price(param.cost_per_hour, param.min_credits)?;
        param.game_type = normalize_game_type(&param.game_type);

        if param.game_type.is_empty() {
            return Err(AppError::BadRequest("Game type cannot be empty".to_string()));
        }

        let repo = PricingRepository::new(self.db);
        if repo.find(&param.game_type).await?.is_some() {
            return Err(PricingError::AlreadyExists(param.game_type).into());
        }

        let game_type = param.game_type.clone();
        let entry = match repo.insert(param, Utc::now()).await {
            Ok(entry) => entry,
            Err(AppError::DbErr(e)) if is_unique_violation(&e) => {
                return Err(PricingError::AlreadyExists(game_type).into())
            }
            Err(e) => return Err(e),
        };

        self.audit.record(
            AuditEvent::new(AuditChannel::Mod, "pricing.add", format!("game:{}", entry.game_type))
                .actor(actor)
                .detail("cost_per_hour", entry.cost_per_hour)
                .detail("min_credits", entry.min_credits),
        );

        Ok(entry)
    }

    /// Hides a game type from creation. Existing servers keep running and billing.
    pub async fn disable_game_type(&self, actor: u64, game_type: &str) -> Result<(), AppError> {
        self.set_active(actor, game_type, false).await
    }

    pub async fn enable_game_type(&self, actor: u64, game_type: &str) -> Result<(), AppError> {
        self.set_active(actor, game_type, true).await
    }

    /// Inserts the default catalog when the table is empty.
    ///
    /// # Returns
    /// - `Ok(usize)` - Number of entries inserted, zero when a catalog already exists
    pub async fn seed_defaults(&self) -> Result<usize, AppError> {
        let repo = PricingRepository::new(self.db);
        if repo.count().await? > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let defaults = default_catalog();
        let count = defaults.len();
        for param in defaults {
            repo.insert(param, now).await?;
        }

        tracing::info!("Seeded pricing catalog with {} game types", count);

        Ok(count)
    }

    async fn set_active(&self, actor: u64, game_type: &str, active: bool) -> Result<(), AppError> {
        let game_type = normalize_game_type(game_type);

        if !PricingRepository::new(self.db)
            .set_active(&game_type, active, Utc::now())
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Unknown game type '{}'",
                game_type
            )));
        }

        self.audit.record(
            AuditEvent::new(
                AuditChannel::Mod,
                if active { "pricing.enable" } else { "pricing.disable" },
                format!("game:{}", game_type),
            )
            .actor(actor),
        );

        Ok(())
    }

    async fn find_required(&self, game_type: &str) -> Result<PricingEntry, AppError> {
        PricingRepository::new(self.db)
            .find(game_type)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown game type '{}'", game_type)))
    }
}

fn validate_price(cost_per_hour: i64, min_credits: i64) -> Result<(), PricingError> {
    if cost_per_hour <= 0 || min_credits < 0 {
        return Err(PricingError::InvalidPrice {
            cost_per_hour,
            min_credits,
        });
    }

    Ok(())
}
