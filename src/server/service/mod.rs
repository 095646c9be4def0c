//! Service layer for business logic and orchestration.
//!
//! Services sit between the command/HTTP glue and the data (repository) layer. They own
//! the platform rules:
//!
//! - **Ledger** and **guild treasury** balances, which never go negative
//! - The game server **lifecycle** state machine and its orchestrator side effects
//! - Hourly **billing**, recurring **schedules** and the **pricing** catalog
//! - **Permission** checks against the persisted role configuration
//!
//! Every state-mutating operation emits one audit event through the injected
//! [`AuditSink`](crate::server::audit::AuditSink).

pub mod billing;
pub mod delete_confirmation;
pub mod guild_treasury;
pub mod ledger;
pub mod lifecycle;
pub mod permission;
pub mod pricing;
pub mod schedule;
pub mod server_registry;
