//! In-memory orchestrator and export doubles for tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::{collections::HashMap, sync::Mutex};

use crate::server::{
    error::orchestrator::OrchestratorError,
    model::game_server::{GameServer, ProvisionedAddress},
    orchestrator::{ExportService, Orchestrator, OrchestratorPhase, ProvisionSpec, SaveExport},
};

/// Orchestrator double with scriptable failures and recorded calls.
#[derive(Default)]
pub struct MockOrchestrator {
    pub fail_provision: bool,
    pub fail_terminate: bool,
    /// Delay applied before answering a provision call.
    pub provision_delay: Option<std::time::Duration>,
    phases: Mutex<HashMap<String, OrchestratorPhase>>,
    provisioned: Mutex<Vec<ProvisionSpec>>,
    terminated: Mutex<Vec<String>>,
}

impl MockOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_provision() -> Self {
        Self {
            fail_provision: true,
            ..Self::default()
        }
    }

    pub fn failing_terminate() -> Self {
        Self {
            fail_terminate: true,
            ..Self::default()
        }
    }

    pub fn slow_provision(delay: std::time::Duration) -> Self {
        Self {
            provision_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_phase(&self, external_id: &str, phase: OrchestratorPhase) {
        self.phases
            .lock()
            .unwrap()
            .insert(external_id.to_string(), phase);
    }

    pub fn provisioned(&self) -> Vec<ProvisionSpec> {
        self.provisioned.lock().unwrap().clone()
    }

    pub fn terminated(&self) -> Vec<String> {
        self.terminated.lock().unwrap().clone()
    }
}

#[async_trait]
impl Orchestrator for MockOrchestrator {
    async fn provision(&self, spec: &ProvisionSpec) -> Result<ProvisionedAddress, OrchestratorError> {
        if let Some(delay) = self.provision_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_provision {
            return Err(OrchestratorError::Rejected {
                status: 503,
                message: "no capacity".to_string(),
            });
        }

        self.provisioned.lock().unwrap().push(spec.clone());
        let external_id = format!("gs-{}", spec.server_id);
        self.set_phase(&external_id, OrchestratorPhase::Scheduled);

        Ok(ProvisionedAddress {
            external_id,
            address: "10.0.0.1".to_string(),
            port: 7000 + spec.server_id as u16,
        })
    }

    async fn terminate(&self, external_id: &str) -> Result<(), OrchestratorError> {
        if self.fail_terminate {
            return Err(OrchestratorError::Rejected {
                status: 500,
                message: "terminate failed".to_string(),
            });
        }

        self.terminated.lock().unwrap().push(external_id.to_string());
        self.set_phase(external_id, OrchestratorPhase::Shutdown);
        Ok(())
    }

    async fn get_status(&self, external_id: &str) -> Result<OrchestratorPhase, OrchestratorError> {
        Ok(self
            .phases
            .lock()
            .unwrap()
            .get(external_id)
            .copied()
            .unwrap_or(OrchestratorPhase::Missing))
    }
}

/// Export double that either succeeds or fails every call.
#[derive(Default)]
pub struct MockExportService {
    pub fail: bool,
    /// Delay applied before answering an export call.
    pub export_delay: Option<std::time::Duration>,
    exported: Mutex<Vec<i32>>,
}

impl MockExportService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: std::time::Duration) -> Self {
        Self {
            export_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn exported(&self) -> Vec<i32> {
        self.exported.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExportService for MockExportService {
    async fn export_save(&self, server: &GameServer) -> Result<SaveExport, OrchestratorError> {
        if let Some(delay) = self.export_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(OrchestratorError::Rejected {
                status: 500,
                message: "export failed".to_string(),
            });
        }

        self.exported.lock().unwrap().push(server.id);
        Ok(SaveExport {
            path: format!("exports/{}.zip", server.id),
            size_bytes: 1024,
            expires_at: Utc::now() + Duration::hours(24),
        })
    }
}
