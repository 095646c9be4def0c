//! Factory methods for creating test data.
//!
//! This module provides factory methods for creating test entities with sensible defaults,
//! reducing boilerplate in tests. Each entity has its own factory module with both a
//! `Factory` struct for customization and a `create_*` convenience function for quick
//! default creation.
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use test_utils::factory;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), sea_orm::DbErr> {
//!     let db = /* ... */;
//!
//!     let user = factory::user::create_user_with_balance(&db, 100).await?;
//!     let (owner, server) = factory::helpers::create_server_with_owner(&db).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Customization
//!
//! ```rust,ignore
//! let server = factory::game_server::GameServerFactory::new(&db, &user.discord_id)
//!     .name("box1")
//!     .status("running")
//!     .build()
//!     .await?;
//! ```
//!
//! # Available Factories
//!
//! - `user` - Ledger accounts
//! - `pricing` - Game type pricing entries
//! - `game_server` - Game server records
//! - `schedule` - Recurring server actions
//! - `guild` - Guild treasuries (owner is added as first member)
//! - `guild_member` - Guild memberships

pub mod game_server;
pub mod guild;
pub mod guild_member;
pub mod helpers;
pub mod pricing;
pub mod schedule;
pub mod user;
