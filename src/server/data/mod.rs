//! Database repository layer for all domain entities.
//!
//! This module contains repository structs that handle database operations for each
//! domain in the application. Repositories use SeaORM entity models internally and return
//! domain models to maintain separation between the data layer and business logic layer.
//!
//! Repositories are generic over [`ConnectionTrait`] so a service can run several of them
//! against one open transaction. Balance and status mutations are single conditional
//! updates; their boolean result tells the caller whether the guard held.

pub mod admin_role;
pub mod game_server;
pub mod guild;
pub mod pricing;
pub mod schedule;
pub mod user;

#[cfg(test)]
mod test;

use sea_orm::{DbErr, SqlErr};

/// Whether a database error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
