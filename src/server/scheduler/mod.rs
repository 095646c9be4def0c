//! Background jobs driven by `tokio-cron-scheduler`.
//!
//! Every job builds its services from a clone of [`AppState`](crate::server::state::AppState)
//! and logs failures instead of propagating them, so one failed pass never stops the
//! scheduler.

pub mod jobs;
