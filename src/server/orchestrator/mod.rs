//! Interfaces to the compute orchestrator and the save-export service.
//!
//! The orchestrator reports its own phase vocabulary (Agones-style `Scheduled`, `Ready`,
//! `Allocated`, ...). [`OrchestratorPhase::normalize`] is the only place those phases are
//! mapped onto [`ServerStatus`]; nothing else in the crate compares phase strings.

pub mod http;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::server::{
    error::orchestrator::OrchestratorError,
    model::game_server::{GameServer, ProvisionedAddress, ServerStatus},
};

/// What to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSpec {
    pub server_id: i32,
    pub owner_id: u64,
    pub name: String,
    pub game_type: String,
}

impl ProvisionSpec {
    pub fn for_server(server: &GameServer) -> Self {
        Self {
            server_id: server.id,
            owner_id: server.owner_id,
            name: server.name.clone(),
            game_type: server.game_type.clone(),
        }
    }
}

/// Live phase reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorPhase {
    Scheduled,
    Creating,
    Starting,
    RequestReady,
    Ready,
    Allocated,
    Reserved,
    Unhealthy,
    Shutdown,
    Error,
    /// The orchestrator no longer knows the server.
    Missing,
}

impl OrchestratorPhase {
    /// Parses a phase name as reported by the orchestrator, ignoring case.
    pub fn parse(value: &str) -> Result<Self, OrchestratorError> {
        let phase = match value.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Self::Scheduled,
            "creating" => Self::Creating,
            "starting" => Self::Starting,
            "requestready" | "request_ready" => Self::RequestReady,
            "ready" => Self::Ready,
            "allocated" | "running" => Self::Allocated,
            "reserved" => Self::Reserved,
            "unhealthy" => Self::Unhealthy,
            "shutdown" | "stopped" => Self::Shutdown,
            "error" | "failed" => Self::Error,
            "missing" | "notfound" | "not_found" => Self::Missing,
            _ => return Err(OrchestratorError::UnknownPhase(value.to_string())),
        };

        Ok(phase)
    }

    /// Canonical server status for this phase.
    pub fn normalize(&self) -> ServerStatus {
        match self {
            Self::Scheduled | Self::Creating | Self::Starting | Self::RequestReady => {
                ServerStatus::Creating
            }
            Self::Ready => ServerStatus::Ready,
            Self::Allocated | Self::Reserved => ServerStatus::Running,
            Self::Shutdown | Self::Missing => ServerStatus::Stopped,
            Self::Unhealthy | Self::Error => ServerStatus::Error,
        }
    }
}

/// Compute orchestrator that runs game servers.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Allocates compute for a server and returns where players connect.
    async fn provision(&self, spec: &ProvisionSpec) -> Result<ProvisionedAddress, OrchestratorError>;

    /// Releases the compute behind `external_id`.
    async fn terminate(&self, external_id: &str) -> Result<(), OrchestratorError>;

    /// Reports the live phase of `external_id`.
    async fn get_status(&self, external_id: &str) -> Result<OrchestratorPhase, OrchestratorError>;
}

/// A downloadable copy of a server's save data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveExport {
    pub path: String,
    pub size_bytes: u64,
    pub expires_at: DateTime<Utc>,
}

/// Exports save data before a server is permanently deleted.
#[async_trait]
pub trait ExportService: Send + Sync {
    async fn export_save(&self, server: &GameServer) -> Result<SaveExport, OrchestratorError>;
}
