use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The cron expression cannot be parsed or never fires.
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCron {
        /// Expression supplied by the user
        expression: String,
        /// Parser message
        reason: String,
    },

    /// The timezone is not a known IANA zone name.
    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),
}
