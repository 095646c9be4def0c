//! Platform backend: core services, persistence and the Discord and HTTP surfaces.
//!
//! # Architecture
//!
//! The server follows a layered architecture:
//!
//! - **Bot** (`bot/`) - Slash command registration and dispatch
//! - **Controller Layer** (`controller/`) - HTTP handlers for health and ad callbacks
//! - **Service Layer** (`service/`) - Ledger, server lifecycle, billing, guild treasury,
//!   schedules, pricing and permissions
//! - **Data Layer** (`data/`) - Database operations and entity-to-domain model conversion
//! - **Model Layer** (`model/`) - Domain models and operation-specific parameter types
//! - **Error Layer** (`error/`) - Application error types and user-facing rendering
//!
//! # Infrastructure
//!
//! - **Audit** (`audit/`) - Audit event sinks (tracing and Discord log channels)
//! - **Orchestrator** (`orchestrator/`) - Compute provisioning collaborator
//! - **Scheduler** (`scheduler/`) - Cron jobs for schedules, billing and reconciliation
//! - **Configuration** (`config`) - Environment-based application configuration
//! - **State** (`state`) - Shared application state
//! - **Startup** (`startup`) - Tracing, database and collaborator initialization
//! - **Router** (`router`) - Axum route configuration

pub mod audit;
pub mod bot;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod router;
pub mod scheduler;
pub mod service;
pub mod startup;
pub mod state;
pub mod util;
