use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricingError {
    /// A game type with this key exists (active or disabled).
    #[error("Game type '{0}' already exists")]
    AlreadyExists(String),

    /// Cost or minimum credits outside the accepted range.
    #[error("Invalid pricing: cost per hour {cost_per_hour}, minimum credits {min_credits}")]
    InvalidPrice {
        /// Requested hourly cost
        cost_per_hour: i64,
        /// Requested minimum balance
        min_credits: i64,
    },
}
