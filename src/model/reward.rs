use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the rewarded-ad callback posted by the ad network.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdRewardDto {
    /// Discord ID of the viewer, as a string.
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AccountDto {
    pub user_id: String,
    pub balance: i64,
    pub tier: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RewardClaimDto {
    pub reward: String,
    pub amount: i64,
    pub account: AccountDto,
    pub claimed_at: DateTime<Utc>,
}
