//! Game server domain models and lifecycle state machine.
//!
//! `ServerStatus` is the single canonical status enumeration. Stored status strings and
//! orchestrator phases are converted into it at the repository and adapter boundaries;
//! services only ever compare enum values.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::server::{
    error::{internal::InternalError, AppError},
    util::parse::parse_u64_from_string,
};

/// How long a server must have been stopped before it becomes a cleanup candidate.
pub const CLEANUP_RETENTION: Duration = Duration::hours(2);

/// Fee charged for a restart, regardless of game type.
pub const RESTART_FEE: i64 = 1;

/// Lifecycle state of a game server.
///
/// `Running` and `Ready` are equivalent for every lifecycle rule; `Ready` means the
/// orchestrator reported the server as accepting players but not yet allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerStatus {
    Creating,
    Running,
    Ready,
    Stopping,
    Stopped,
    Error,
}

impl ServerStatus {
    /// Value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Running => "running",
            Self::Ready => "ready",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }

    /// Parses a status name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "creating" => Some(Self::Creating),
            "running" => Some(Self::Running),
            "ready" => Some(Self::Ready),
            "stopping" => Some(Self::Stopping),
            "stopped" => Some(Self::Stopped),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether the server is up (`running` or `ready`).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Ready)
    }

    /// Whether the server accrues hourly charges in this state.
    pub fn is_billable(&self) -> bool {
        matches!(self, Self::Creating | Self::Running | Self::Ready)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Any state may fall into `error`. Moderator overrides bypass this check.
    pub fn can_transition_to(&self, next: ServerStatus) -> bool {
        use ServerStatus::*;

        if next == Error {
            return true;
        }

        match (self, next) {
            (Creating, Running | Ready | Stopping) => true,
            (Running, Ready) | (Ready, Running) => true,
            (Running | Ready, Stopping | Creating) => true,
            (Stopping, Stopped) => true,
            (Stopped, Creating) => true,
            (Error, Stopping | Stopped) => true,
            _ => false,
        }
    }

    /// Every status, in lifecycle order.
    pub fn all() -> [ServerStatus; 6] {
        [
            Self::Creating,
            Self::Running,
            Self::Ready,
            Self::Stopping,
            Self::Stopped,
            Self::Error,
        ]
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A game server record.
#[derive(Debug, Clone, PartialEq)]
pub struct GameServer {
    pub id: i32,
    /// Discord ID of the owner.
    pub owner_id: u64,
    /// Guild treasury paying for the server, if guild-funded.
    pub guild_id: Option<String>,
    pub name: String,
    pub game_type: String,
    pub status: ServerStatus,
    /// Hourly cost frozen at creation time.
    pub cost_per_hour: i64,
    /// Orchestrator identifier, assigned after provisioning.
    pub external_id: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
    /// Listed in the public lobby.
    pub is_public: bool,
    /// Last failure reason when in `error`.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    /// Hourly charges have been paid up to this instant.
    pub last_billed_at: DateTime<Utc>,
}

impl GameServer {
    /// Converts an entity model to a game server domain model at the repository boundary.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - The converted server
    /// - `Err(AppError::InternalErr)` - Stored owner ID, status or port is invalid
    pub fn from_entity(entity: entity::game_server::Model) -> Result<Self, AppError> {
        let status =
            ServerStatus::parse(&entity.status).ok_or_else(|| InternalError::UnknownStoredValue {
                column: "game_server.status",
                value: entity.status.clone(),
            })?;
        let port = entity
            .port
            .map(|port| {
                u16::try_from(port).map_err(|_| InternalError::UnknownStoredValue {
                    column: "game_server.port",
                    value: port.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            id: entity.id,
            owner_id: parse_u64_from_string(entity.owner_id)?,
            guild_id: entity.guild_id,
            name: entity.name,
            game_type: entity.game_type,
            status,
            cost_per_hour: entity.cost_per_hour,
            external_id: entity.external_id,
            address: entity.address,
            port,
            is_public: entity.is_public,
            error_message: entity.error_message,
            created_at: entity.created_at,
            stopped_at: entity.stopped_at,
            last_billed_at: entity.last_billed_at,
        })
    }

    /// Whether the server has been stopped for longer than [`CLEANUP_RETENTION`].
    pub fn is_cleanup_candidate(&self, now: DateTime<Utc>) -> bool {
        self.status == ServerStatus::Stopped
            && self
                .stopped_at
                .is_some_and(|stopped_at| now - stopped_at > CLEANUP_RETENTION)
    }

    /// Who is charged for this server's hours and fees.
    pub fn payer(&self) -> Payer {
        match &self.guild_id {
            Some(guild_id) => Payer::Guild(guild_id.clone()),
            None => Payer::User(self.owner_id),
        }
    }

    /// Connection string shown to players, once provisioned.
    pub fn connect_address(&self) -> Option<String> {
        match (&self.address, self.port) {
            (Some(address), Some(port)) => Some(format!("{}:{}", address, port)),
            (Some(address), None) => Some(address.clone()),
            _ => None,
        }
    }
}

/// Balance a server's charges are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payer {
    /// The owner's personal credits.
    User(u64),
    /// A guild treasury.
    Guild(String),
}

impl fmt::Display for Payer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user_id) => write!(f, "user:{}", user_id),
            Self::Guild(guild_id) => write!(f, "guild:{}", guild_id),
        }
    }
}

/// Parameters for inserting a new server record.
#[derive(Debug, Clone)]
pub struct CreateServerParam {
    pub owner_id: u64,
    pub guild_id: Option<String>,
    pub name: String,
    pub game_type: String,
    /// Hourly cost to freeze on the record and debit up front.
    pub cost_per_hour: i64,
    pub now: DateTime<Utc>,
}

/// A guarded status update together with the columns that move with it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub to: ServerStatus,
    /// `Some(value)` overwrites `stopped_at`; `None` leaves it untouched.
    pub stopped_at: Option<Option<DateTime<Utc>>>,
    /// `Some(value)` overwrites `error_message`.
    pub error_message: Option<Option<String>>,
    /// Overwrites the paid-through instant.
    pub last_billed_at: Option<DateTime<Utc>>,
    /// Removes the server from the public lobby.
    pub clear_public: bool,
}

impl StatusChange {
    /// A bare status change touching no other column.
    pub fn to(status: ServerStatus) -> Self {
        Self {
            to: status,
            stopped_at: None,
            error_message: None,
            last_billed_at: None,
            clear_public: false,
        }
    }

    /// Moves to `stopping` and delists the server.
    pub fn stopping() -> Self {
        Self {
            clear_public: true,
            ..Self::to(ServerStatus::Stopping)
        }
    }

    /// Moves to `stopped`, recording when.
    pub fn stopped(now: DateTime<Utc>) -> Self {
        Self {
            stopped_at: Some(Some(now)),
            clear_public: true,
            ..Self::to(ServerStatus::Stopped)
        }
    }

    /// Moves to `creating` for a fresh provisioning run.
    pub fn creating() -> Self {
        Self {
            stopped_at: Some(None),
            error_message: Some(None),
            ..Self::to(ServerStatus::Creating)
        }
    }

    /// Sets the instant charges have been paid through.
    pub fn billed_through(mut self, paid_through: DateTime<Utc>) -> Self {
        self.last_billed_at = Some(paid_through);
        self
    }

    /// Moves to `error` with the failure reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            error_message: Some(Some(reason.into())),
            clear_public: true,
            ..Self::to(ServerStatus::Error)
        }
    }
}

/// Address assigned by the orchestrator after provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedAddress {
    pub external_id: String,
    pub address: String,
    pub port: u16,
}

/// Result of a stop request.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The server was already stopped or stopping; nothing changed.
    AlreadyStopped(GameServer),
    /// The server moved to `stopping`; compute has not been released yet.
    Stopping(GameServer),
    /// Compute was released and the server is `stopped`.
    Stopped(GameServer),
}

impl StopOutcome {
    pub fn server(&self) -> &GameServer {
        match self {
            Self::AlreadyStopped(server) | Self::Stopping(server) | Self::Stopped(server) => server,
        }
    }
}

/// A pending two-phase deletion returned to the requester.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteConfirmation {
    /// Opaque token that must be echoed back to confirm.
    pub token: String,
    /// The server that will be deleted.
    pub server: GameServer,
    pub expires_at: DateTime<Utc>,
}
