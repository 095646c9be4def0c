//! Ready event handler for bot initialization.
//!
//! Fired once per gateway connection after the initial handshake. Registers the global
//! slash commands, replacing whatever set was registered before.

use serenity::all::{ActivityData, Command, Context, Ready};

use crate::server::bot::command;

/// Handles the ready event when the bot connects to Discord.
///
/// # Arguments
/// - `ctx` - Discord context used to register commands and set the activity
/// - `ready` - Ready event data containing bot user information
pub async fn handle_ready(ctx: Context, ready: Ready) {
    tracing::info!("{} is connected to Discord", ready.user.name);

    match Command::set_global_commands(&ctx.http, command::definitions()).await {
        Ok(commands) => tracing::info!("Registered {} slash commands", commands.len()),
        Err(e) => tracing::error!("Failed to register slash commands: {}", e),
    }

    ctx.set_activity(Some(ActivityData::custom("/server types")));
}
