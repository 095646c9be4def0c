//! HTTP adapter for the provisioning API.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `POST /servers` with [`ProvisionRequest`] returns [`ProvisionResponse`]
//! - `DELETE /servers/{external_id}`
//! - `GET /servers/{external_id}/status` returns [`StatusResponse`]
//! - `POST /servers/{external_id}/export` returns [`ExportResponse`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::server::{
    error::orchestrator::OrchestratorError,
    model::game_server::{GameServer, ProvisionedAddress},
    orchestrator::{ExportService, Orchestrator, OrchestratorPhase, ProvisionSpec, SaveExport},
};

#[derive(Serialize)]
struct ProvisionRequest<'a> {
    server_id: i32,
    owner_id: String,
    name: &'a str,
    game_type: &'a str,
}

#[derive(Deserialize)]
struct ProvisionResponse {
    external_id: String,
    address: String,
    port: u16,
}

#[derive(Deserialize)]
struct StatusResponse {
    phase: String,
}

#[derive(Deserialize)]
struct ExportResponse {
    path: String,
    size_bytes: u64,
    expires_at: DateTime<Utc>,
}

/// Orchestrator and export client speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpOrchestrator {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpOrchestrator {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turns non-success responses into [`OrchestratorError::Rejected`].
    async fn check(response: Response) -> Result<Response, OrchestratorError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(OrchestratorError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn provision(&self, spec: &ProvisionSpec) -> Result<ProvisionedAddress, OrchestratorError> {
        let body = ProvisionRequest {
            server_id: spec.server_id,
            owner_id: spec.owner_id.to_string(),
            name: &spec.name,
            game_type: &spec.game_type,
        };

        let response = self
            .authorize(self.client.post(self.url("/servers")))
            .json(&body)
            .send()
            .await?;
        let provisioned: ProvisionResponse = Self::check(response).await?.json().await?;

        Ok(ProvisionedAddress {
            external_id: provisioned.external_id,
            address: provisioned.address,
            port: provisioned.port,
        })
    }

    async fn terminate(&self, external_id: &str) -> Result<(), OrchestratorError> {
        let response = self
            .authorize(
                self.client
                    .delete(self.url(&format!("/servers/{}", external_id))),
            )
            .send()
            .await?;

        // Already gone is as good as terminated.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::check(response).await?;
        Ok(())
    }

    async fn get_status(&self, external_id: &str) -> Result<OrchestratorPhase, OrchestratorError> {
        let response = self
            .authorize(
                self.client
                    .get(self.url(&format!("/servers/{}/status", external_id))),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(OrchestratorPhase::Missing);
        }

        let status: StatusResponse = Self::check(response).await?.json().await?;
        OrchestratorPhase::parse(&status.phase)
    }
}

#[async_trait]
impl ExportService for HttpOrchestrator {
    async fn export_save(&self, server: &GameServer) -> Result<SaveExport, OrchestratorError> {
        let Some(external_id) = server.external_id.as_deref() else {
            return Err(OrchestratorError::Rejected {
                status: StatusCode::CONFLICT.as_u16(),
                message: format!("server {} was never provisioned", server.id),
            });
        };

        let response = self
            .authorize(
                self.client
                    .post(self.url(&format!("/servers/{}/export", external_id))),
            )
            .send()
            .await?;
        let export: ExportResponse = Self::check(response).await?.json().await?;

        Ok(SaveExport {
            path: export.path,
            size_bytes: export.size_bytes,
            expires_at: export.expires_at,
        })
    }
}
