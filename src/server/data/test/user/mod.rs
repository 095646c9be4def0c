use crate::server::{
    data::user::UserRepository,
    error::AppError,
    model::user::{RewardKind, Tier},
};
use chrono::{Duration, Utc};
use test_utils::{builder::TestBuilder, factory::user::UserFactory};

mod adjust_balance;
mod claim_reward;
mod get_or_create;
mod set_tier;
