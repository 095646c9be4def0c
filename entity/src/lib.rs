//! SeaORM entity definitions for every table managed by the `migration` crate.

pub mod prelude;

pub mod admin_role;
pub mod game_server;
pub mod guild;
pub mod guild_member;
pub mod pricing;
pub mod schedule;
pub mod user;
