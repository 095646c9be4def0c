use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{model::api::HealthDto, server::state::AppState};

/// GET /api/health - Liveness and database reachability
///
/// # Returns
/// - `200 OK`: Database reachable
/// - `503 Service Unavailable`: Database ping failed
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Health check database ping failed: {}", e);
            false
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthDto {
            status: if database { "ok" } else { "degraded" }.to_string(),
            database,
        }),
    )
}
