//! Schedule repository.
//!
//! Owner-scoped mutations filter on both the schedule ID and the owner, so a mismatched
//! owner can never change another user's schedule even if the service check is bypassed.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::server::{
    error::AppError,
    model::schedule::{CreateScheduleParam, Schedule},
};

pub struct ScheduleRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ScheduleRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Inserts an enabled schedule with a precomputed next run.
    pub async fn create(
        &self,
        param: CreateScheduleParam,
        next_run: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Schedule, AppError> {
        let entity = entity::schedule::ActiveModel {
            id: ActiveValue::NotSet,
            server_id: ActiveValue::Set(param.server_id),
            owner_id: ActiveValue::Set(param.owner_id.to_string()),
            action: ActiveValue::Set(param.action.as_str().to_string()),
            cron_expression: ActiveValue::Set(param.cron_expression),
            timezone: ActiveValue::Set(param.timezone),
            enabled: ActiveValue::Set(true),
            next_run: ActiveValue::Set(next_run),
            last_run: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
        }
        .insert(self.db)
        .await?;

        Schedule::from_entity(entity)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Schedule>, AppError> {
        let entity = entity::prelude::Schedule::find_by_id(id).one(self.db).await?;

        entity.map(Schedule::from_entity).transpose()
    }

    /// Lists the schedules of a server that belong to `owner_id`.
    ///
    /// Schedules of other owners on the same server are never returned.
    pub async fn list_by_server_and_owner(
        &self,
        server_id: i32,
        owner_id: u64,
    ) -> Result<Vec<Schedule>, AppError> {
        let entities = entity::prelude::Schedule::find()
            .filter(entity::schedule::Column::ServerId.eq(server_id))
            .filter(entity::schedule::Column::OwnerId.eq(owner_id.to_string()))
            .order_by_asc(entity::schedule::Column::Id)
            .all(self.db)
            .await?;

        entities.into_iter().map(Schedule::from_entity).collect()
    }

    /// Lists enabled schedules whose next run is at or before `now`.
    pub async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, AppError> {
        let entities = entity::prelude::Schedule::find()
            .filter(entity::schedule::Column::Enabled.eq(true))
            .filter(entity::schedule::Column::NextRun.lte(now))
            .order_by_asc(entity::schedule::Column::NextRun)
            .all(self.db)
            .await?;

        entities.into_iter().map(Schedule::from_entity).collect()
    }

    /// Enables or disables a schedule owned by `owner_id`.
    ///
    /// Enabling also stores a freshly computed `next_run`, so a schedule that was disabled
    /// for a while does not fire for the runs it missed.
    ///
    /// # Returns
    /// - `Ok(true)` - Flag updated
    /// - `Ok(false)` - No schedule with that ID and owner
    pub async fn set_enabled(
        &self,
        id: i32,
        owner_id: u64,
        enabled: bool,
        next_run: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError> {
        let mut update = entity::prelude::Schedule::update_many()
            .col_expr(entity::schedule::Column::Enabled, Expr::value(enabled))
            .filter(entity::schedule::Column::Id.eq(id))
            .filter(entity::schedule::Column::OwnerId.eq(owner_id.to_string()));

        if enabled {
            update = update.col_expr(entity::schedule::Column::NextRun, Expr::value(next_run));
        }

        let result = update.exec(self.db).await?;

        Ok(result.rows_affected == 1)
    }

    /// Deletes a schedule owned by `owner_id`.
    pub async fn delete(&self, id: i32, owner_id: u64) -> Result<bool, AppError> {
        let result = entity::prelude::Schedule::delete_many()
            .filter(entity::schedule::Column::Id.eq(id))
            .filter(entity::schedule::Column::OwnerId.eq(owner_id.to_string()))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Deletes every schedule of a server.
    ///
    /// # Returns
    /// - `Ok(u64)` - Number of schedules removed
    pub async fn delete_by_server(&self, server_id: i32) -> Result<u64, AppError> {
        let result = entity::prelude::Schedule::delete_many()
            .filter(entity::schedule::Column::ServerId.eq(server_id))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Claims a due run: moves `next_run` from `expected` to `next_run` and stamps
    /// `last_run`.
    ///
    /// The update only matches while `next_run` still equals `expected`, so when two
    /// trigger passes see the same due schedule only one of them gets to run it.
    ///
    /// # Returns
    /// - `Ok(true)` - Run claimed
    /// - `Ok(false)` - Another pass claimed it first, or the schedule changed; skip it
    pub async fn claim_run(
        &self,
        id: i32,
        expected: DateTime<Utc>,
        last_run: DateTime<Utc>,
        next_run: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError> {
        let result = entity::prelude::Schedule::update_many()
            .col_expr(entity::schedule::Column::LastRun, Expr::value(last_run))
            .col_expr(entity::schedule::Column::NextRun, Expr::value(next_run))
            .filter(entity::schedule::Column::Id.eq(id))
            .filter(entity::schedule::Column::NextRun.eq(expected))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
