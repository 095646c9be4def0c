//! Recurring schedule domain models.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::server::{
    error::{internal::InternalError, AppError},
    util::parse::parse_u64_from_string,
};

/// Lifecycle action a schedule performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    Start,
    Stop,
    Restart,
}

impl ScheduleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "restart" => Some(Self::Restart),
            _ => None,
        }
    }
}

impl fmt::Display for ScheduleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring lifecycle action bound to one server and its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub id: i32,
    pub server_id: i32,
    pub owner_id: u64,
    pub action: ScheduleAction,
    /// Five-field cron expression.
    pub cron_expression: String,
    /// IANA timezone the expression is evaluated in.
    pub timezone: String,
    pub enabled: bool,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    /// Converts an entity model to a schedule domain model at the repository boundary.
    ///
    /// # Returns
    /// - `Ok(Schedule)` - The converted schedule
    /// - `Err(AppError::InternalErr)` - Stored owner ID or action is invalid
    pub fn from_entity(entity: entity::schedule::Model) -> Result<Self, AppError> {
        let action =
            ScheduleAction::parse(&entity.action).ok_or_else(|| InternalError::UnknownStoredValue {
                column: "schedule.action",
                value: entity.action.clone(),
            })?;

        Ok(Self {
            id: entity.id,
            server_id: entity.server_id,
            owner_id: parse_u64_from_string(entity.owner_id)?,
            action,
            cron_expression: entity.cron_expression,
            timezone: entity.timezone,
            enabled: entity.enabled,
            next_run: entity.next_run,
            last_run: entity.last_run,
            created_at: entity.created_at,
        })
    }
}

/// Parameters for creating a schedule.
#[derive(Debug, Clone)]
pub struct CreateScheduleParam {
    pub server_id: i32,
    pub owner_id: u64,
    pub action: ScheduleAction,
    pub cron_expression: String,
    pub timezone: String,
}
