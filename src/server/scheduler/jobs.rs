use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::server::{
    audit::{AuditChannel, AuditEvent},
    error::AppError,
    service::{billing::BillingService, schedule::ScheduleService},
    state::AppState,
};

/// Fires due user schedules at the top of every minute.
const SCHEDULE_TRIGGER_CRON: &str = "0 * * * * *";
/// Charges running servers every five minutes.
const BILLING_CRON: &str = "0 */5 * * * *";
/// Polls the orchestrator every minute, offset from the schedule trigger.
const RECONCILE_CRON: &str = "30 * * * * *";

/// Starts the platform scheduler.
///
/// Registers three jobs:
/// - Schedule trigger: runs due start/stop/restart schedules
/// - Billing: charges the hours due on every billable server
/// - Reconciliation: aligns server statuses with the orchestrator
///
/// # Returns
/// - `Ok(JobScheduler)` - The running scheduler; dropping it does not stop the jobs
/// - `Err(AppError::SchedulerErr)` - A job could not be registered
pub async fn start_scheduler(state: AppState) -> Result<JobScheduler, AppError> {
    let scheduler = JobScheduler::new().await?;

    let job_state = state.clone();
    scheduler
        .add(Job::new_async(SCHEDULE_TRIGGER_CRON, move |_uuid, _lock| {
            let state = job_state.clone();

            Box::pin(async move {
                if let Err(e) = trigger_schedules(&state).await {
                    report_job_error(&state, "schedule_trigger", e);
                }
            })
        })?)
        .await?;

    let job_state = state.clone();
    scheduler
        .add(Job::new_async(BILLING_CRON, move |_uuid, _lock| {
            let state = job_state.clone();

            Box::pin(async move {
                if let Err(e) = accrue_billing(&state).await {
                    report_job_error(&state, "billing", e);
                }
            })
        })?)
        .await?;

    let job_state = state;
    scheduler
        .add(Job::new_async(RECONCILE_CRON, move |_uuid, _lock| {
            let state = job_state.clone();

            Box::pin(async move {
                if let Err(e) = reconcile_statuses(&state).await {
                    report_job_error(&state, "reconcile", e);
                }
            })
        })?)
        .await?;

    scheduler.start().await?;

    tracing::info!("Platform scheduler started");

    Ok(scheduler)
}

async fn trigger_schedules(state: &AppState) -> Result<(), AppError> {
    let lifecycle = state.lifecycle();
    let report = ScheduleService::new(&state.db, state.audit.as_ref())
        .trigger_due(&lifecycle, Utc::now())
        .await?;

    if report.fired > 0 {
        tracing::info!(
            fired = report.fired,
            failed = report.failed,
            "Processed due schedules"
        );
    }

    Ok(())
}

async fn accrue_billing(state: &AppState) -> Result<(), AppError> {
    let lifecycle = state.lifecycle();
    BillingService::new(&state.db, state.audit.as_ref())
        .accrue(&lifecycle, Utc::now())
        .await?;

    Ok(())
}

async fn reconcile_statuses(state: &AppState) -> Result<(), AppError> {
    let report = state.lifecycle().reconcile_statuses(Utc::now()).await?;

    if report.updated > 0 || report.failed > 0 {
        tracing::info!(
            checked = report.checked,
            updated = report.updated,
            failed = report.failed,
            "Reconciled server statuses"
        );
    }

    Ok(())
}

fn report_job_error(state: &AppState, job: &'static str, error: AppError) {
    tracing::error!(job, "Scheduled job failed: {}", error);
    state.audit.record(
        AuditEvent::new(AuditChannel::Error, "scheduler.job", job).detail("error", error),
    );
}
