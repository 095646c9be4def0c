use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::server::model::user::RewardKind;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The account cannot cover a debit.
    ///
    /// The balance is left unchanged. Carries both amounts so the caller can tell
    /// the user exactly how many credits are missing.
    #[error("Insufficient credits: need {required}, have {available}")]
    InsufficientCredits {
        /// Credits the operation needed
        required: i64,
        /// Credits the account holds
        available: i64,
    },

    /// A reward was claimed again before its cooldown elapsed.
    #[error("{reward} reward is on cooldown until {available_at}")]
    CooldownActive {
        /// Which reward was claimed
        reward: RewardKind,
        /// Earliest moment the reward can be claimed again
        available_at: DateTime<Utc>,
    },

    /// A credit amount outside the accepted range.
    #[error("Invalid credit amount: {0}")]
    InvalidAmount(i64),
}
