//! Slash command definitions and dispatch.
//!
//! Commands are thin glue: each one reads its options, calls a core service and renders
//! the outcome as plain text. Failures are rendered by the interaction handler using
//! [`AppError::user_message`](crate::server::error::AppError::user_message).

pub mod account;
pub mod admin;
pub mod guild;
pub mod schedule;
pub mod server;

use chrono::{DateTime, Utc};
use serenity::all::{CommandInteraction, CreateCommand, ResolvedOption, ResolvedValue};

use crate::server::{
    error::AppError,
    model::permission::Capability,
    service::permission::{MemberContext, PermissionService},
    state::AppState,
};

/// Discord rejects message content longer than this.
const MAX_REPLY_LEN: usize = 2000;

/// Who invoked a command, and when.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub user_id: u64,
    pub member: MemberContext,
    /// Holds the Discord `ADMINISTRATOR` permission in the invoking guild.
    pub discord_admin: bool,
    pub now: DateTime<Utc>,
}

impl Invocation {
    pub fn from_command(command: &CommandInteraction, now: DateTime<Utc>) -> Self {
        let member = command.member.as_deref();

        Self {
            user_id: command.user.id.get(),
            member: MemberContext {
                guild_id: command.guild_id.map(|id| id.get()),
                role_ids: member
                    .map(|m| m.roles.iter().map(|role| role.get()).collect())
                    .unwrap_or_default(),
            },
            discord_admin: member
                .and_then(|m| m.permissions)
                .is_some_and(|permissions| permissions.administrator()),
            now,
        }
    }

    /// Fails with `Forbidden` unless the invoker holds `required`.
    ///
    /// Discord server administrators pass every check so a fresh installation can be
    /// configured before any role grant exists.
    pub async fn require(&self, state: &AppState, required: Capability) -> Result<(), AppError> {
        if self.discord_admin {
            return Ok(());
        }

        PermissionService::new(&state.db, state.audit.as_ref())
            .require(self.user_id, &self.member, required)
            .await?;

        Ok(())
    }

    pub async fn is_platform_admin(&self, state: &AppState) -> Result<bool, AppError> {
        if self.discord_admin {
            return Ok(true);
        }

        let capability = PermissionService::new(&state.db, state.audit.as_ref())
            .capability(self.user_id, &self.member)
            .await?;

        Ok(capability == Capability::Admin)
    }
}

/// Every slash command the bot registers.
pub fn definitions() -> Vec<CreateCommand> {
    vec![
        account::balance_definition(),
        account::daily_definition(),
        account::work_definition(),
        server::definition(),
        guild::definition(),
        schedule::definition(),
        admin::definition(),
    ]
}

/// Runs a command and returns the reply text.
pub async fn run(
    state: &AppState,
    name: &str,
    options: Vec<ResolvedOption<'_>>,
    invocation: &Invocation,
) -> Result<String, AppError> {
    match name {
        "balance" => account::balance(state, invocation).await,
        "daily" => account::daily(state, invocation).await,
        "work" => account::work(state, invocation).await,
        "server" => server::run(state, options, invocation).await,
        "guild" => guild::run(state, options, invocation).await,
        "schedule" => schedule::run(state, options, invocation).await,
        "admin" => admin::run(state, options, invocation).await,
        other => Err(AppError::BadRequest(format!("Unknown command '{}'", other))),
    }
}

/// Options of one (sub)command, looked up by name.
pub struct Options<'a> {
    options: Vec<ResolvedOption<'a>>,
}

impl<'a> Options<'a> {
    pub fn new(options: Vec<ResolvedOption<'a>>) -> Self {
        Self { options }
    }

    /// Splits a command into its subcommand name and that subcommand's options.
    pub fn subcommand(options: Vec<ResolvedOption<'a>>) -> Result<(&'a str, Self), AppError> {
        let Some(first) = options.into_iter().next() else {
            return Err(AppError::BadRequest("Missing subcommand".to_string()));
        };

        match first.value {
            ResolvedValue::SubCommand(options) => Ok((first.name, Self::new(options))),
            _ => Err(AppError::BadRequest(format!(
                "'{}' is not a subcommand",
                first.name
            ))),
        }
    }

    fn value(&self, name: &str) -> Option<&ResolvedValue<'a>> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| &option.value)
    }

    pub fn string(&self, name: &str) -> Result<&'a str, AppError> {
        self.optional_string(name).ok_or_else(|| missing(name))
    }

    pub fn optional_string(&self, name: &str) -> Option<&'a str> {
        match self.value(name) {
            Some(ResolvedValue::String(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, AppError> {
        match self.value(name) {
            Some(ResolvedValue::Integer(value)) => Ok(*value),
            _ => Err(missing(name)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, AppError> {
        match self.value(name) {
            Some(ResolvedValue::Boolean(value)) => Ok(*value),
            _ => Err(missing(name)),
        }
    }

    /// Discord ID of a user option.
    pub fn user(&self, name: &str) -> Result<u64, AppError> {
        match self.value(name) {
            Some(ResolvedValue::User(user, _)) => Ok(user.id.get()),
            _ => Err(missing(name)),
        }
    }

    /// Discord ID of a role option.
    pub fn role(&self, name: &str) -> Result<u64, AppError> {
        match self.value(name) {
            Some(ResolvedValue::Role(role)) => Ok(role.id.get()),
            _ => Err(missing(name)),
        }
    }
}

fn missing(name: &str) -> AppError {
    AppError::BadRequest(format!("Missing option '{}'", name))
}

/// Cuts a reply to Discord's message limit on a character boundary.
pub fn truncate_reply(mut reply: String) -> String {
    if reply.len() <= MAX_REPLY_LEN {
        return reply;
    }

    let mut end = MAX_REPLY_LEN - 1;
    while !reply.is_char_boundary(end) {
        end -= 1;
    }
    reply.truncate(end);
    reply.push('…');
    reply
}
