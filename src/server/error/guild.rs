use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuildError {
    /// A guild with this ID already exists.
    #[error("A guild with id '{0}' already exists")]
    AlreadyExists(String),

    /// The user is already a member of the guild.
    #[error("User {user_id} is already a member of guild '{guild_id}'")]
    AlreadyMember {
        /// Guild ID
        guild_id: String,
        /// Discord ID of the member
        user_id: u64,
    },

    /// The user is not a member of the guild.
    #[error("User {user_id} is not a member of guild '{guild_id}'")]
    NotMember {
        /// Guild ID
        guild_id: String,
        /// Discord ID of the user
        user_id: u64,
    },

    /// The treasury cannot cover a spend.
    #[error("Insufficient guild funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Credits the operation needed
        required: i64,
        /// Credits in the treasury
        available: i64,
    },

    /// Deposit or spend amount must be positive.
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),
}
