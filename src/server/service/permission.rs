//! Capability checks and role configuration.
//!
//! A user's capability is the highest of their platform admin flag and the grants
//! configured for their Discord roles. Both are read from the database on every check.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink},
    data::{admin_role::AdminRoleRepository, user::UserRepository},
    error::AppError,
    model::permission::{Capability, RoleGrant},
};

/// Where a command was invoked from.
///
/// Direct messages have no Discord guild and therefore no roles.
#[derive(Debug, Clone, Default)]
pub struct MemberContext {
    pub guild_id: Option<u64>,
    pub role_ids: Vec<u64>,
}

pub struct PermissionService<'a> {
    db: &'a DatabaseConnection,
    audit: &'a dyn AuditSink,
}

impl<'a> PermissionService<'a> {
    pub fn new(db: &'a DatabaseConnection, audit: &'a dyn AuditSink) -> Self {
        Self { db, audit }
    }

    /// Resolves the capability of `user_id` in the given context.
    pub async fn capability(
        &self,
        user_id: u64,
        member: &MemberContext,
    ) -> Result<Capability, AppError> {
        if let Some(account) = UserRepository::new(self.db).find(user_id).await? {
            if account.admin {
                return Ok(Capability::Admin);
            }
        }

        let Some(guild_id) = member.guild_id else {
            return Ok(Capability::User);
        };

        let granted = AdminRoleRepository::new(self.db)
            .highest_for_roles(guild_id, &member.role_ids)
            .await?;

        Ok(granted.unwrap_or(Capability::User))
    }

    /// Fails with `Forbidden` unless the user holds at least `required`.
    pub async fn require(
        &self,
        user_id: u64,
        member: &MemberContext,
        required: Capability,
    ) -> Result<Capability, AppError> {
        let capability = self.capability(user_id, member).await?;

        if capability < required {
            return Err(AppError::Forbidden(format!(
                "This command requires the {} capability",
                required
            )));
        }

        Ok(capability)
    }

    /// Grants `level` to a Discord role, replacing any previous grant for that role.
    pub async fn grant_role(
        &self,
        actor: u64,
        guild_id: u64,
        role_id: u64,
        level: Capability,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if level == Capability::User {
            return Err(AppError::BadRequest(
                "Roles can only be granted moderator or admin".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        AdminRoleRepository::new(&txn)
            .grant(guild_id, role_id, level, now)
            .await?;
        txn.commit().await?;

        tracing::info!(actor, guild_id, role_id, %level, "Granted role capability");
        self.audit.record(
            AuditEvent::new(AuditChannel::Mod, "permission.grant", format!("role:{}", role_id))
                .actor(actor)
                .detail("guild", guild_id)
                .detail("level", level),
        );

        Ok(())
    }

    /// Removes a role's grant.
    ///
    /// # Returns
    /// - `Ok(())` - Grant removed
    /// - `Err(AppError::NotFound)` - The role had no grant
    pub async fn revoke_role(&self, actor: u64, guild_id: u64, role_id: u64) -> Result<(), AppError> {
        if !AdminRoleRepository::new(self.db)
            .revoke(guild_id, role_id)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Role {} has no capability grant",
                role_id
            )));
        }

        tracing::info!(actor, guild_id, role_id, "Revoked role capability");
        self.audit.record(
            AuditEvent::new(AuditChannel::Mod, "permission.revoke", format!("role:{}", role_id))
                .actor(actor)
                .detail("guild", guild_id),
        );

        Ok(())
    }

    pub async fn list_roles(&self, guild_id: u64) -> Result<Vec<RoleGrant>, AppError> {
        AdminRoleRepository::new(self.db).list(guild_id).await
    }

    /// Sets or clears the platform admin flag on a user, creating the account if needed.
    pub async fn set_platform_admin(
        &self,
        actor: u64,
        user_id: u64,
        admin: bool,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let repo = UserRepository::new(self.db);
        let before = repo.get_or_create(user_id, now).await?.admin;

        repo.set_admin(user_id, admin).await?;

        tracing::info!(actor, user_id, before, after = admin, "Changed platform admin flag");
        self.audit.record(
            AuditEvent::new(AuditChannel::Mod, "permission.set_admin", format!("user:{}", user_id))
                .actor(actor)
                .detail("before", before)
                .detail("after", admin),
        );

        Ok(())
    }
}
