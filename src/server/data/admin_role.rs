//! Persisted role configuration.
//!
//! Maps Discord roles to platform capabilities. Permission checks always read from this
//! table; nothing is cached in memory.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::server::{
    error::{internal::InternalError, AppError},
    model::permission::{Capability, RoleGrant},
    util::parse::parse_u64_from_string,
};

pub struct AdminRoleRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AdminRoleRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Grants a capability to a role, replacing any previous grant for that role.
    ///
    /// Run inside a transaction so the update-or-insert pair is not interleaved.
    pub async fn grant(
        &self,
        guild_id: u64,
        role_id: u64,
        level: Capability,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let updated = entity::prelude::AdminRole::update_many()
            .col_expr(entity::admin_role::Column::Level, Expr::value(level.as_str()))
            .filter(entity::admin_role::Column::GuildId.eq(guild_id.to_string()))
            .filter(entity::admin_role::Column::RoleId.eq(role_id.to_string()))
            .exec(self.db)
            .await?;

        if updated.rows_affected == 0 {
            entity::admin_role::ActiveModel {
                guild_id: ActiveValue::Set(guild_id.to_string()),
                role_id: ActiveValue::Set(role_id.to_string()),
                level: ActiveValue::Set(level.as_str().to_string()),
                created_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .insert(self.db)
            .await?;
        }

        Ok(())
    }

    /// Removes a role's grant.
    ///
    /// # Returns
    /// - `Ok(true)` - Grant removed
    /// - `Ok(false)` - The role had no grant
    pub async fn revoke(&self, guild_id: u64, role_id: u64) -> Result<bool, AppError> {
        let result = entity::prelude::AdminRole::delete_many()
            .filter(entity::admin_role::Column::GuildId.eq(guild_id.to_string()))
            .filter(entity::admin_role::Column::RoleId.eq(role_id.to_string()))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Lists the grants configured for a Discord guild.
    pub async fn list(&self, guild_id: u64) -> Result<Vec<RoleGrant>, AppError> {
        let entities = entity::prelude::AdminRole::find()
            .filter(entity::admin_role::Column::GuildId.eq(guild_id.to_string()))
            .order_by_asc(entity::admin_role::Column::RoleId)
            .all(self.db)
            .await?;

        entities.into_iter().map(role_grant_from_entity).collect()
    }

    /// Highest capability granted to any of `role_ids` in a Discord guild.
    ///
    /// # Returns
    /// - `Ok(Some(Capability))` - At least one role has a grant
    /// - `Ok(None)` - None of the roles has a grant
    pub async fn highest_for_roles(
        &self,
        guild_id: u64,
        role_ids: &[u64],
    ) -> Result<Option<Capability>, AppError> {
        if role_ids.is_empty() {
            return Ok(None);
        }

        let role_ids: Vec<String> = role_ids.iter().map(|id| id.to_string()).collect();
        let entities = entity::prelude::AdminRole::find()
            .filter(entity::admin_role::Column::GuildId.eq(guild_id.to_string()))
            .filter(entity::admin_role::Column::RoleId.is_in(role_ids))
            .all(self.db)
            .await?;

        let mut highest = None;
        for entity in entities {
            let grant = role_grant_from_entity(entity)?;
            highest = highest.max(Some(grant.level));
        }

        Ok(highest)
    }
}

fn role_grant_from_entity(entity: entity::admin_role::Model) -> Result<RoleGrant, AppError> {
    let level =
        Capability::parse(&entity.level).ok_or_else(|| InternalError::UnknownStoredValue {
            column: "admin_role.level",
            value: entity.level.clone(),
        })?;

    Ok(RoleGrant {
        guild_id: parse_u64_from_string(entity.guild_id)?,
        role_id: parse_u64_from_string(entity.role_id)?,
        level,
    })
}
