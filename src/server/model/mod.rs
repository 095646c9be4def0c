//! Server-side domain models and parameter types.
//!
//! This module contains domain models used throughout the service layer, representing
//! business entities and operation parameters. Domain models are converted from entity
//! models at the repository boundary, where stored strings (Discord IDs, status and
//! tier columns) become typed values. Services never compare raw status strings.

pub mod game_server;
pub mod guild;
pub mod permission;
pub mod pricing;
pub mod schedule;
pub mod user;
