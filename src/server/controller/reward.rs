use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    model::reward::AdRewardDto,
    server::{error::AppError, service::ledger::LedgerService, state::AppState},
};

/// Header carrying the secret shared with the ad network.
pub const REWARD_SECRET_HEADER: &str = "x-reward-secret";

/// POST /api/rewards/ad - Credit a verified rewarded-ad view
///
/// Called by the ad network, never by users directly.
///
/// # Authentication
/// Requires the `X-Reward-Secret` header to match the configured secret
///
/// # Returns
/// - `200 OK`: JSON RewardClaimDto with the updated account
/// - `400 Bad Request`: `user_id` is not a Discord ID
/// - `403 Forbidden`: Missing or wrong secret
/// - `429 Too Many Requests`: Ad reward still on cooldown
pub async fn ad_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AdRewardDto>,
) -> Result<impl IntoResponse, AppError> {
    let presented = headers
        .get(REWARD_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.ad_reward_secret.as_str()) {
        tracing::warn!("Rejected ad reward callback with invalid secret");
        return Err(AppError::Forbidden("Invalid reward secret".to_string()));
    }

    let user_id = payload
        .user_id
        .trim()
        .parse::<u64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid user ID '{}'", payload.user_id)))?;

    let now = Utc::now();
    let claim = LedgerService::new(&state.db, state.audit.as_ref())
        .claim_ad_reward(user_id, now)
        .await?;

    Ok((StatusCode::OK, Json(claim.into_dto(now))))
}
