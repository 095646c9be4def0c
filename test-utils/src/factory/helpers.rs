//! Shared helper utilities for factory methods.
//!
//! This module provides common utilities used across all factory modules,
//! including ID generation and convenience methods for creating entities
//! with their dependencies.

use sea_orm::{DatabaseConnection, DbErr};

/// Counter for generating unique IDs in tests.
///
/// This atomic counter ensures each factory-created entity gets a unique
/// identifier to prevent collisions in tests.
static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

/// Gets the next unique counter value for test data.
///
/// # Returns
/// - `u64` - Next unique counter value
pub fn next_id() -> u64 {
    COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
}

/// Creates a running game server together with its owning user.
///
/// The owner starts with a balance of 100 credits and the server is in the
/// `running` state with an external ID assigned.
///
/// # Arguments
/// - `db` - Database connection
///
/// # Returns
/// - `Ok((user, server))` - Tuple of the created entities
/// - `Err(DbErr)` - Database error during creation
pub async fn create_server_with_owner(
    db: &DatabaseConnection,
) -> Result<(entity::user::Model, entity::game_server::Model), DbErr> {
    let user = crate::factory::user::create_user_with_balance(db, 100).await?;
    let server = crate::factory::game_server::GameServerFactory::new(db, &user.discord_id)
        .status("running")
        .external_id(Some(format!("gs-{}", next_id())))
        .build()
        .await?;

    Ok((user, server))
}
