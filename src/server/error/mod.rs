//! Error types and response handling.
//!
//! This module provides the application's error hierarchy. `AppError` is the top-level
//! error type that wraps the per-area errors (ledger, servers, guild treasuries,
//! schedules, pricing) and infrastructure failures. It is rendered two ways: as an HTTP
//! response for the callback API, and as a plain-text message for Discord replies.
//!
//! Validation outcomes (insufficient credits, cooldowns, ownership failures, ...) are
//! expected results returned to the user and are never logged as system errors. See
//! [`AppError::is_expected`].

pub mod config;
pub mod guild;
pub mod internal;
pub mod ledger;
pub mod orchestrator;
pub mod pricing;
pub mod schedule;
pub mod server;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{
    model::api::ErrorDto,
    server::error::{
        config::ConfigError, guild::GuildError, internal::InternalError, ledger::LedgerError,
        orchestrator::OrchestratorError, pricing::PricingError, schedule::ScheduleError,
        server::ServerError,
    },
};

/// Top-level application error type.
///
/// Aggregates all possible error types that can occur in the application. Most variants
/// use `#[from]` for automatic error conversion so services can use `?` freely.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error during startup or environment variable loading.
    #[error(transparent)]
    ConfigErr(#[from] ConfigError),

    /// Credit ledger rule violation (insufficient credits, cooldown).
    #[error(transparent)]
    LedgerErr(#[from] LedgerError),

    /// Game server lifecycle rule violation or provisioning failure.
    #[error(transparent)]
    ServerErr(#[from] ServerError),

    /// Guild treasury rule violation.
    #[error(transparent)]
    GuildErr(#[from] GuildError),

    /// Schedule validation error.
    #[error(transparent)]
    ScheduleErr(#[from] ScheduleError),

    /// Pricing catalog validation error.
    #[error(transparent)]
    PricingErr(#[from] PricingError),

    /// Orchestrator or export collaborator failure.
    #[error(transparent)]
    OrchestratorErr(#[from] OrchestratorError),

    /// Unexpected internal state, usually a corrupt stored value.
    #[error(transparent)]
    InternalErr(#[from] InternalError),

    /// Database operation error from SeaORM.
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),

    /// HTTP client request error from reqwest.
    #[error(transparent)]
    ReqwestErr(#[from] reqwest::Error),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size.
    #[error(transparent)]
    DiscordErr(#[from] Box<serenity::Error>),

    /// Cron scheduler error.
    #[error(transparent)]
    SchedulerErr(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// Resource not found error.
    ///
    /// # Fields
    /// - Message describing what resource was not found
    #[error("{0}")]
    NotFound(String),

    /// Ownership or capability check failed.
    ///
    /// # Fields
    /// - Message describing what was refused
    #[error("{0}")]
    Forbidden(String),

    /// Invalid request error.
    ///
    /// # Fields
    /// - Message describing what was invalid about the request
    #[error("{0}")]
    BadRequest(String),

    /// Internal error with custom message.
    ///
    /// The message is logged but a generic message is returned to users.
    #[error("{0}")]
    InternalError(String),
}

/// Manual conversion from serenity::Error to AppError.
///
/// Boxes the error to reduce the size of the AppError enum, as serenity::Error
/// is very large and would make all AppError variants larger if not boxed.
impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::DiscordErr(Box::new(err))
    }
}

impl AppError {
    /// Whether this error is an expected, user-facing outcome.
    ///
    /// Expected errors are shown to the user verbatim and are not logged as system
    /// errors. Everything else (persistence, provisioning, Discord, internal) is logged
    /// and forwarded to the error audit channel by the caller.
    pub fn is_expected(&self) -> bool {
        match self {
            Self::LedgerErr(_)
            | Self::GuildErr(_)
            | Self::ScheduleErr(_)
            | Self::PricingErr(_)
            | Self::NotFound(_)
            | Self::Forbidden(_)
            | Self::BadRequest(_) => true,
            Self::ServerErr(err) => !matches!(err, ServerError::ProvisioningFailed { .. }),
            _ => false,
        }
    }

    /// Message safe to show to the end user.
    ///
    /// Expected errors carry their own actionable text; unexpected errors collapse to a
    /// generic message so internal details never reach chat or HTTP clients.
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerErr(ServerError::ProvisioningFailed { .. }) => {
                "The server could not be provisioned. Your credits for this hour were refunded."
                    .to_string()
            }
            err if err.is_expected() => err.to_string(),
            _ => "Something went wrong, please try again later.".to_string(),
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::LedgerErr(LedgerError::InsufficientCredits { .. })
            | Self::GuildErr(GuildError::InsufficientFunds { .. }) => StatusCode::PAYMENT_REQUIRED,
            Self::LedgerErr(LedgerError::CooldownActive { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Self::ServerErr(ServerError::DuplicateName { .. })
            | Self::ServerErr(ServerError::InvalidState { .. })
            | Self::GuildErr(GuildError::AlreadyExists(_))
            | Self::GuildErr(GuildError::AlreadyMember { .. })
            | Self::PricingErr(PricingError::AlreadyExists(_)) => StatusCode::CONFLICT,
            Self::ServerErr(ServerError::ProvisioningFailed { .. }) | Self::OrchestratorErr(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::ServerErr(ServerError::ConfirmationNotFound) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Forbidden(_) | Self::GuildErr(GuildError::NotMember { .. }) => {
                StatusCode::FORBIDDEN
            }
            err if err.is_expected() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts application errors into HTTP responses.
///
/// Expected errors return their message with a specific status code. Everything else is
/// logged with full details and returns a generic 500 (or 502 for provisioning failures)
/// to avoid leaking implementation details.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if !self.is_expected() {
            tracing::error!("{}", self);
        }

        (
            status,
            Json(ErrorDto {
                error: self.user_message(),
            }),
        )
            .into_response()
    }
}
