//! Game server repository.
//!
//! Status transitions are compare-and-swap updates: the `UPDATE` only matches when the
//! stored status is one of the states the transition is valid from. Two concurrent
//! transitions on the same server therefore resolve to exactly one winner.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::server::{
    error::AppError,
    model::game_server::{
        CreateServerParam, GameServer, ProvisionedAddress, ServerStatus, StatusChange,
    },
};

pub struct GameServerRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> GameServerRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Inserts a new server in the `creating` state.
    ///
    /// The first hour is paid up front, so the server is billed through `param.now` plus
    /// one hour.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - The inserted server
    /// - `Err(AppError::DbErr)` - Database error, including a unique violation on
    ///   `(owner_id, name)`
    pub async fn create(&self, param: CreateServerParam) -> Result<GameServer, AppError> {
        let entity = entity::game_server::ActiveModel {
            id: ActiveValue::NotSet,
            owner_id: ActiveValue::Set(param.owner_id.to_string()),
            guild_id: ActiveValue::Set(param.guild_id),
            name: ActiveValue::Set(param.name),
            game_type: ActiveValue::Set(param.game_type),
            status: ActiveValue::Set(ServerStatus::Creating.as_str().to_string()),
            cost_per_hour: ActiveValue::Set(param.cost_per_hour),
            external_id: ActiveValue::Set(None),
            address: ActiveValue::Set(None),
            port: ActiveValue::Set(None),
            is_public: ActiveValue::Set(false),
            error_message: ActiveValue::Set(None),
            created_at: ActiveValue::Set(param.now),
            stopped_at: ActiveValue::Set(None),
            last_billed_at: ActiveValue::Set(param.now + Duration::hours(1)),
        }
        .insert(self.db)
        .await?;

        GameServer::from_entity(entity)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<GameServer>, AppError> {
        let entity = entity::prelude::GameServer::find_by_id(id)
            .one(self.db)
            .await?;

        entity.map(GameServer::from_entity).transpose()
    }

    /// Finds a server by its owner and name.
    ///
    /// Names are unique per owner, so at most one server matches.
    pub async fn find_by_owner_and_name(
        &self,
        owner_id: u64,
        name: &str,
    ) -> Result<Option<GameServer>, AppError> {
        let entity = entity::prelude::GameServer::find()
            .filter(entity::game_server::Column::OwnerId.eq(owner_id.to_string()))
            .filter(entity::game_server::Column::Name.eq(name))
            .one(self.db)
            .await?;

        entity.map(GameServer::from_entity).transpose()
    }

    /// Lists the servers of one owner, oldest first.
    pub async fn list_by_owner(&self, owner_id: u64) -> Result<Vec<GameServer>, AppError> {
        let entities = entity::prelude::GameServer::find()
            .filter(entity::game_server::Column::OwnerId.eq(owner_id.to_string()))
            .order_by_asc(entity::game_server::Column::CreatedAt)
            .all(self.db)
            .await?;

        entities.into_iter().map(GameServer::from_entity).collect()
    }

    /// Lists every server, oldest first.
    pub async fn list_all(&self) -> Result<Vec<GameServer>, AppError> {
        let entities = entity::prelude::GameServer::find()
            .order_by_asc(entity::game_server::Column::CreatedAt)
            .all(self.db)
            .await?;

        entities.into_iter().map(GameServer::from_entity).collect()
    }

    /// Lists servers currently in any of the given states.
    pub async fn list_by_status(
        &self,
        statuses: &[ServerStatus],
    ) -> Result<Vec<GameServer>, AppError> {
        let entities = entity::prelude::GameServer::find()
            .filter(entity::game_server::Column::Status.is_in(status_strings(statuses)))
            .order_by_asc(entity::game_server::Column::Id)
            .all(self.db)
            .await?;

        entities.into_iter().map(GameServer::from_entity).collect()
    }

    /// Lists public servers that are up.
    pub async fn list_public(&self) -> Result<Vec<GameServer>, AppError> {
        let entities = entity::prelude::GameServer::find()
            .filter(entity::game_server::Column::IsPublic.eq(true))
            .filter(
                entity::game_server::Column::Status.is_in(status_strings(&[
                    ServerStatus::Running,
                    ServerStatus::Ready,
                ])),
            )
            .order_by_asc(entity::game_server::Column::Name)
            .all(self.db)
            .await?;

        entities.into_iter().map(GameServer::from_entity).collect()
    }

    /// Lists stopped servers whose `stopped_at` is strictly before `cutoff`.
    pub async fn list_stopped_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<GameServer>, AppError> {
        let entities = entity::prelude::GameServer::find()
            .filter(entity::game_server::Column::Status.eq(ServerStatus::Stopped.as_str()))
            .filter(entity::game_server::Column::StoppedAt.lt(cutoff))
            .order_by_asc(entity::game_server::Column::StoppedAt)
            .all(self.db)
            .await?;

        entities.into_iter().map(GameServer::from_entity).collect()
    }

    /// Applies a status change if the stored status is one of `from`.
    ///
    /// An empty `from` slice applies the change unconditionally; it is reserved for
    /// moderator overrides.
    ///
    /// # Returns
    /// - `Ok(true)` - The change was applied
    /// - `Ok(false)` - Server missing or not in an allowed state; nothing changed
    /// - `Err(AppError)` - Database error
    pub async fn transition(
        &self,
        id: i32,
        from: &[ServerStatus],
        change: StatusChange,
    ) -> Result<bool, AppError> {
        let mut update = entity::prelude::GameServer::update_many()
            .col_expr(
                entity::game_server::Column::Status,
                Expr::value(change.to.as_str()),
            )
            .filter(entity::game_server::Column::Id.eq(id));

        if !from.is_empty() {
            update = update.filter(entity::game_server::Column::Status.is_in(status_strings(from)));
        }
        if let Some(stopped_at) = change.stopped_at {
            update = update.col_expr(
                entity::game_server::Column::StoppedAt,
                Expr::value(stopped_at),
            );
        }
        if let Some(error_message) = change.error_message {
            update = update.col_expr(
                entity::game_server::Column::ErrorMessage,
                Expr::value(error_message),
            );
        }
        if let Some(last_billed_at) = change.last_billed_at {
            update = update.col_expr(
                entity::game_server::Column::LastBilledAt,
                Expr::value(last_billed_at),
            );
        }
        if change.clear_public {
            update = update.col_expr(entity::game_server::Column::IsPublic, Expr::value(false));
        }

        let result = update.exec(self.db).await?;

        Ok(result.rows_affected == 1)
    }

    /// Records the orchestrator identity and address of a provisioned server.
    ///
    /// Only applies while the server is still `creating`; a server stopped or deleted
    /// while provisioning was in flight keeps its record untouched.
    ///
    /// # Returns
    /// - `Ok(true)` - Address stored
    /// - `Ok(false)` - Server missing or no longer `creating`; nothing changed
    pub async fn set_provisioned(
        &self,
        id: i32,
        provisioned: ProvisionedAddress,
    ) -> Result<bool, AppError> {
        let result = entity::prelude::GameServer::update_many()
            .col_expr(
                entity::game_server::Column::ExternalId,
                Expr::value(provisioned.external_id),
            )
            .col_expr(
                entity::game_server::Column::Address,
                Expr::value(provisioned.address),
            )
            .col_expr(
                entity::game_server::Column::Port,
                Expr::value(i32::from(provisioned.port)),
            )
            .filter(entity::game_server::Column::Id.eq(id))
            .filter(entity::game_server::Column::Status.eq(ServerStatus::Creating.as_str()))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Sets or clears the public-lobby flag.
    ///
    /// Listing is guarded on the server being `running` or `ready`; delisting is always
    /// applied.
    ///
    /// # Returns
    /// - `Ok(true)` - Flag updated
    /// - `Ok(false)` - Server missing, or not up when listing
    pub async fn set_public(&self, id: i32, is_public: bool) -> Result<bool, AppError> {
        let mut update = entity::prelude::GameServer::update_many()
            .col_expr(entity::game_server::Column::IsPublic, Expr::value(is_public))
            .filter(entity::game_server::Column::Id.eq(id));

        if is_public {
            update = update.filter(entity::game_server::Column::Status.is_in(status_strings(&[
                ServerStatus::Running,
                ServerStatus::Ready,
            ])));
        }

        let result = update.exec(self.db).await?;

        Ok(result.rows_affected == 1)
    }

    /// Moves the paid-through instant forward if nobody else has moved it.
    ///
    /// # Returns
    /// - `Ok(true)` - Paid-through advanced from `expected` to `next`
    /// - `Ok(false)` - Changed concurrently; the caller must not charge
    pub async fn advance_billing(
        &self,
        id: i32,
        expected: DateTime<Utc>,
        next: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = entity::prelude::GameServer::update_many()
            .col_expr(
                entity::game_server::Column::LastBilledAt,
                Expr::value(next),
            )
            .filter(entity::game_server::Column::Id.eq(id))
            .filter(entity::game_server::Column::LastBilledAt.eq(expected))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Hard-deletes a stopped server record.
    ///
    /// Callers remove the server's schedules first, inside the same transaction.
    ///
    /// # Returns
    /// - `Ok(true)` - Server deleted
    /// - `Ok(false)` - No server with that ID, or it is no longer `stopped`
    pub async fn delete_stopped(&self, id: i32) -> Result<bool, AppError> {
        let result = entity::prelude::GameServer::delete_many()
            .filter(entity::game_server::Column::Id.eq(id))
            .filter(entity::game_server::Column::Status.eq(ServerStatus::Stopped.as_str()))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }
}

fn status_strings(statuses: &[ServerStatus]) -> Vec<&'static str> {
    statuses.iter().map(ServerStatus::as_str).collect()
}
