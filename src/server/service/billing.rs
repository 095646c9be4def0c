//! Hourly billing for running servers.
//!
//! `last_billed_at` is the instant a server is paid through. Once that instant has
//! passed, the hour starting at it is due, plus every further full hour that elapsed.
//! The charge and the paid-through advance commit together; the advance is a
//! compare-and-swap on the previous value so overlapping billing runs never charge the
//! same hour twice.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink},
    data::game_server::GameServerRepository,
    error::{guild::GuildError, ledger::LedgerError, AppError},
    model::game_server::{GameServer, ServerStatus},
    service::{lifecycle::LifecycleService, server_registry::charge},
};

const BILLABLE_STATUSES: [ServerStatus; 3] = [
    ServerStatus::Creating,
    ServerStatus::Running,
    ServerStatus::Ready,
];

/// Outcome of one billing pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BillingReport {
    /// Servers charged this pass.
    pub charged: usize,
    /// Total credits collected.
    pub collected: i64,
    /// Servers stopped because their payer could not cover the charge.
    pub stopped: usize,
}

/// Number of hours due at `now` for a server paid through `paid_through`.
pub fn hours_due(paid_through: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if now < paid_through {
        return 0;
    }

    (now - paid_through).num_hours() + 1
}

pub struct BillingService<'a> {
    db: &'a DatabaseConnection,
    audit: &'a dyn AuditSink,
}

impl<'a> BillingService<'a> {
    pub fn new(db: &'a DatabaseConnection, audit: &'a dyn AuditSink) -> Self {
        Self { db, audit }
    }

    /// Charges every billable server for the hours due at `now`.
    ///
    /// Servers whose payer cannot cover the charge are stopped through `lifecycle` and
    /// reported to the error channel; the pass continues with the next server.
    pub async fn accrue(
        &self,
        lifecycle: &LifecycleService<'_>,
        now: DateTime<Utc>,
    ) -> Result<BillingReport, AppError> {
        let servers = GameServerRepository::new(self.db)
            .list_by_status(&BILLABLE_STATUSES)
            .await?;
        let mut report = BillingReport::default();

        for server in servers {
            let hours = hours_due(server.last_billed_at, now);
            if hours == 0 {
                continue;
            }

            match self.charge_hours(&server, hours, now).await {
                Ok(Some(amount)) => {
                    report.charged += 1;
                    report.collected += amount;
                }
                Ok(None) => {}
                Err(AppError::LedgerErr(LedgerError::InsufficientCredits { required, available }))
                | Err(AppError::GuildErr(GuildError::InsufficientFunds { required, available })) => {
                    tracing::info!(
                        server_id = server.id,
                        required,
                        available,
                        "Stopping server with unpaid hours"
                    );
                    self.audit.record(
                        AuditEvent::new(AuditChannel::Error, "billing.unpaid", format!("server:{}", server.id))
                            .detail("payer", server.payer())
                            .detail("required", required)
                            .detail("available", available),
                    );

                    if let Err(e) = lifecycle.stop(&server, None, now).await {
                        tracing::error!(server_id = server.id, "Failed to stop unpaid server: {}", e);
                    }
                    report.stopped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if report.charged > 0 || report.stopped > 0 {
            tracing::info!(
                charged = report.charged,
                collected = report.collected,
                stopped = report.stopped,
                "Billing pass complete"
            );
        }

        Ok(report)
    }

    /// Charges `hours` for one server.
    ///
    /// # Returns
    /// - `Ok(Some(amount))` - Charged and paid-through advanced
    /// - `Ok(None)` - Another pass already billed these hours
    /// - `Err(AppError::LedgerErr(InsufficientCredits))` /
    ///   `Err(AppError::GuildErr(InsufficientFunds))` - Nothing charged
    async fn charge_hours(
        &self,
        server: &GameServer,
        hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, AppError> {
        let amount = server.cost_per_hour * hours;
        let paid_through = server.last_billed_at + Duration::hours(hours);

        let txn = self.db.begin().await?;

        if !GameServerRepository::new(&txn)
            .advance_billing(server.id, server.last_billed_at, paid_through)
            .await?
        {
            return Ok(None);
        }

        charge(&txn, &server.payer(), amount, now).await?;

        txn.commit().await?;

        self.audit.record(
            AuditEvent::new(AuditChannel::Audit, "billing.charge", format!("server:{}", server.id))
                .detail("payer", server.payer())
                .detail("hours", hours)
                .detail("amount", amount)
                .detail("paid_through", paid_through),
        );

        Ok(Some(amount))
    }
}
