//! Schedule factory for creating test recurring actions.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating schedules with customizable fields.
///
/// # Example
///
/// ```rust,ignore
/// let schedule = ScheduleFactory::new(&db, server.id, &server.owner_id)
///     .action("stop")
///     .next_run(Some(Utc::now()))
///     .build()
///     .await?;
/// ```
pub struct ScheduleFactory<'a> {
    db: &'a DatabaseConnection,
    server_id: i32,
    owner_id: String,
    action: String,
    cron_expression: String,
    timezone: String,
    enabled: bool,
    next_run: Option<DateTime<Utc>>,
}

impl<'a> ScheduleFactory<'a> {
    /// Creates a new ScheduleFactory with default values.
    ///
    /// Defaults:
    /// - action: `"start"`
    /// - cron_expression: `"0 18 * * *"`
    /// - timezone: `"UTC"`
    /// - enabled: `true`
    /// - next_run: one hour from now
    pub fn new(db: &'a DatabaseConnection, server_id: i32, owner_id: impl Into<String>) -> Self {
        Self {
            db,
            server_id,
            owner_id: owner_id.into(),
            action: "start".to_string(),
            cron_expression: "0 18 * * *".to_string(),
            timezone: "UTC".to_string(),
            enabled: true,
            next_run: Some(Utc::now() + chrono::Duration::hours(1)),
        }
    }

    /// Sets the action (`"start"`, `"stop"` or `"restart"`).
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Sets the cron expression.
    pub fn cron_expression(mut self, cron_expression: impl Into<String>) -> Self {
        self.cron_expression = cron_expression.into();
        self
    }

    /// Sets the IANA timezone name.
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Sets whether the schedule fires.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the next fire time.
    pub fn next_run(mut self, next_run: Option<DateTime<Utc>>) -> Self {
        self.next_run = next_run;
        self
    }

    /// Builds and inserts the schedule entity into the database.
    pub async fn build(self) -> Result<entity::schedule::Model, DbErr> {
        entity::schedule::ActiveModel {
            id: ActiveValue::NotSet,
            server_id: ActiveValue::Set(self.server_id),
            owner_id: ActiveValue::Set(self.owner_id),
            action: ActiveValue::Set(self.action),
            cron_expression: ActiveValue::Set(self.cron_expression),
            timezone: ActiveValue::Set(self.timezone),
            enabled: ActiveValue::Set(self.enabled),
            next_run: ActiveValue::Set(self.next_run),
            last_run: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }
}

/// Creates an enabled schedule with default values.
pub async fn create_schedule(
    db: &DatabaseConnection,
    server_id: i32,
    owner_id: impl Into<String>,
) -> Result<entity::schedule::Model, DbErr> {
    ScheduleFactory::new(db, server_id, owner_id).build().await
}
