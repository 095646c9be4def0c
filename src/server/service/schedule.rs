//! Recurring server actions.
//!
//! Schedules bind a cron expression, evaluated in an IANA timezone, to a start, stop or
//! restart of one server on behalf of its owner. Every mutation checks the requester
//! owns the schedule. The trigger pass always records the run and recomputes the next
//! fire time, whether or not the action itself succeeded.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use croner::Cron;
use sea_orm::DatabaseConnection;

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink},
    data::schedule::ScheduleRepository,
    error::{schedule::ScheduleError, AppError},
    model::schedule::{CreateScheduleParam, Schedule, ScheduleAction},
    service::{lifecycle::LifecycleService, server_registry::ServerRegistryService},
};

/// Outcome of one trigger pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TriggerReport {
    pub fired: usize,
    pub failed: usize,
}

/// Parses a cron expression.
///
/// # Returns
/// - `Ok(Cron)` - Parsed expression
/// - `Err(ScheduleError::InvalidCron)` - Expression does not parse
pub fn parse_cron(expression: &str) -> Result<Cron, ScheduleError> {
    Cron::new(expression.trim())
        .parse()
        .map_err(|e| ScheduleError::InvalidCron {
            expression: expression.to_string(),
            reason: e.to_string(),
        })
}

/// Parses an IANA timezone name such as `Europe/Berlin`.
pub fn parse_timezone(timezone: &str) -> Result<Tz, ScheduleError> {
    timezone
        .trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(timezone.to_string()))
}

/// First fire time strictly after `after`, evaluated in `timezone`.
pub fn next_run_after(
    expression: &str,
    timezone: &str,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let cron = parse_cron(expression)?;
    let tz = parse_timezone(timezone)?;

    cron.find_next_occurrence(&after.with_timezone(&tz), false)
        .map(|next| next.with_timezone(&Utc))
        .map_err(|e| ScheduleError::InvalidCron {
            expression: expression.to_string(),
            reason: e.to_string(),
        })
}

pub struct ScheduleService<'a> {
    db: &'a DatabaseConnection,
    audit: &'a dyn AuditSink,
}

impl<'a> ScheduleService<'a> {
    pub fn new(db: &'a DatabaseConnection, audit: &'a dyn AuditSink) -> Self {
        Self { db, audit }
    }

    /// Creates an enabled schedule on one of the requester's servers.
    ///
    /// # Returns
    /// - `Ok(Schedule)` - The schedule with its first `next_run`
    /// - `Err(AppError::ScheduleErr(InvalidCron))` - Unparseable expression
    /// - `Err(AppError::ScheduleErr(InvalidTimezone))` - Unknown timezone
    /// - `Err(AppError::Forbidden)` - Server belongs to someone else
    /// - `Err(AppError::NotFound)` - Unknown server
    pub async fn create_schedule(
        &self,
        param: CreateScheduleParam,
        now: DateTime<Utc>,
    ) -> Result<Schedule, AppError> {
        let next_run = next_run_after(&param.cron_expression, &param.timezone, now)?;

        let server = ServerRegistryService::new(self.db, self.audit)
            .get(param.server_id)
            .await?;
        if server.owner_id != param.owner_id {
            return Err(AppError::Forbidden(
                "You can only schedule your own servers".to_string(),
            ));
        }

        let param = CreateScheduleParam {
            cron_expression: param.cron_expression.trim().to_string(),
            timezone: param.timezone.trim().to_string(),
            ..param
        };
        let schedule = ScheduleRepository::new(self.db)
            .create(param, Some(next_run), now)
            .await?;

        tracing::info!(
            schedule_id = schedule.id,
            server_id = schedule.server_id,
            action = %schedule.action,
            %next_run,
            "Created schedule"
        );
        self.audit.record(
            AuditEvent::new(AuditChannel::User, "schedule.create", format!("schedule:{}", schedule.id))
                .actor(schedule.owner_id)
                .detail("server", schedule.server_id)
                .detail("action", schedule.action)
                .detail("cron", &schedule.cron_expression)
                .detail("timezone", &schedule.timezone),
        );

        Ok(schedule)
    }

    /// The requester's schedules on a server. Other owners' schedules are never returned.
    pub async fn get_server_schedules(
        &self,
        server_id: i32,
        owner_id: u64,
    ) -> Result<Vec<Schedule>, AppError> {
        ScheduleRepository::new(self.db)
            .list_by_server_and_owner(server_id, owner_id)
            .await
    }

    /// Re-enables a schedule, computing the next run from `now`.
    ///
    /// # Returns
    /// - `Ok(Schedule)` - Enabled schedule
    /// - `Err(AppError::Forbidden)` - Requester does not own the schedule
    /// - `Err(AppError::NotFound)` - Unknown schedule
    pub async fn enable(
        &self,
        schedule_id: i32,
        owner_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Schedule, AppError> {
        let schedule = self.owned(schedule_id, owner_id).await?;
        let next_run = next_run_after(&schedule.cron_expression, &schedule.timezone, now)?;

        self.set_enabled(&schedule, true, Some(next_run)).await
    }

    /// Disables a schedule. It is kept and can be re-enabled.
    pub async fn disable(&self, schedule_id: i32, owner_id: u64) -> Result<Schedule, AppError> {
        let schedule = self.owned(schedule_id, owner_id).await?;

        self.set_enabled(&schedule, false, None).await
    }

    /// Deletes a schedule owned by the requester.
    pub async fn delete(&self, schedule_id: i32, owner_id: u64) -> Result<(), AppError> {
        let schedule = self.owned(schedule_id, owner_id).await?;

        if !ScheduleRepository::new(self.db)
            .delete(schedule.id, owner_id)
            .await?
        {
            return Err(not_found(schedule_id));
        }

        self.audit.record(
            AuditEvent::new(AuditChannel::User, "schedule.delete", format!("schedule:{}", schedule_id))
                .actor(owner_id)
                .detail("server", schedule.server_id),
        );

        Ok(())
    }

    /// Fires every enabled schedule whose `next_run` has passed.
    ///
    /// Each run is claimed before its action executes: `last_run` is stamped and
    /// `next_run` recomputed in one compare-and-swap, and a schedule claimed by an
    /// overlapping pass is skipped. Actions run with the schedule owner as actor.
    /// Failures are reported to the error channel and do not undo the claim.
    pub async fn trigger_due(
        &self,
        lifecycle: &LifecycleService<'_>,
        now: DateTime<Utc>,
    ) -> Result<TriggerReport, AppError> {
        let repo = ScheduleRepository::new(self.db);
        let due = repo.find_due(now).await?;
        let mut report = TriggerReport::default();

        for schedule in due {
            let Some(expected) = schedule.next_run else {
                continue;
            };
            let next_run = match next_run_after(&schedule.cron_expression, &schedule.timezone, now) {
                Ok(next) => Some(next),
                Err(e) => {
                    tracing::error!(schedule_id = schedule.id, "Cannot compute next run: {}", e);
                    None
                }
            };

            if !repo.claim_run(schedule.id, expected, now, next_run).await? {
                tracing::debug!(schedule_id = schedule.id, "Schedule already claimed by another pass");
                continue;
            }
            report.fired += 1;

            if let Err(e) = self.run_action(lifecycle, &schedule, now).await {
                report.failed += 1;
                if e.is_expected() {
                    tracing::info!(schedule_id = schedule.id, "Scheduled action refused: {}", e);
                } else {
                    tracing::error!(schedule_id = schedule.id, "Scheduled action failed: {}", e);
                }
                self.audit.record(
                    AuditEvent::new(AuditChannel::Error, "schedule.trigger", format!("schedule:{}", schedule.id))
                        .actor(schedule.owner_id)
                        .detail("server", schedule.server_id)
                        .detail("action", schedule.action)
                        .detail("error", e),
                );
            }
        }

        Ok(report)
    }

    async fn run_action(
        &self,
        lifecycle: &LifecycleService<'_>,
        schedule: &Schedule,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let server = lifecycle.registry().get(schedule.server_id).await?;
        if server.owner_id != schedule.owner_id {
            return Err(AppError::Forbidden(format!(
                "Schedule {} does not belong to the server owner",
                schedule.id
            )));
        }

        let actor = Some(schedule.owner_id);
        match schedule.action {
            ScheduleAction::Start => {
                lifecycle.start(&server, actor, now).await?;
            }
            ScheduleAction::Stop => {
                lifecycle.stop(&server, actor, now).await?;
            }
            ScheduleAction::Restart => {
                lifecycle.restart(&server, actor, now).await?;
            }
        }

        tracing::info!(
            schedule_id = schedule.id,
            server_id = server.id,
            action = %schedule.action,
            "Ran scheduled action"
        );

        Ok(())
    }

    async fn owned(&self, schedule_id: i32, owner_id: u64) -> Result<Schedule, AppError> {
        let schedule = ScheduleRepository::new(self.db)
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| not_found(schedule_id))?;

        if schedule.owner_id != owner_id {
            return Err(AppError::Forbidden(format!(
                "Schedule {} belongs to another user",
                schedule_id
            )));
        }

        Ok(schedule)
    }

    async fn set_enabled(
        &self,
        schedule: &Schedule,
        enabled: bool,
        next_run: Option<DateTime<Utc>>,
    ) -> Result<Schedule, AppError> {
        let repo = ScheduleRepository::new(self.db);

        if !repo
            .set_enabled(schedule.id, schedule.owner_id, enabled, next_run)
            .await?
        {
            return Err(not_found(schedule.id));
        }

        self.audit.record(
            AuditEvent::new(
                AuditChannel::User,
                if enabled { "schedule.enable" } else { "schedule.disable" },
                format!("schedule:{}", schedule.id),
            )
            .actor(schedule.owner_id)
            .detail("before", schedule.enabled)
            .detail("after", enabled),
        );

        repo.find_by_id(schedule.id)
            .await?
            .ok_or_else(|| not_found(schedule.id))
    }
}

fn not_found(schedule_id: i32) -> AppError {
    AppError::NotFound(format!("Schedule {} not found", schedule_id))
}
