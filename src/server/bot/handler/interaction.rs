//! Slash command interaction handler.

use chrono::Utc;
use serenity::all::{Context, EditInteractionResponse, Interaction};

use crate::server::{
    audit::{AuditChannel, AuditEvent},
    bot::command::{self, truncate_reply, Invocation},
    state::AppState,
};

/// Runs a slash command and edits the deferred reply with its outcome.
///
/// Replies are ephemeral. Expected failures are shown verbatim; anything else is logged,
/// reported to the error channel and replaced with a generic message.
pub async fn handle_interaction(state: &AppState, ctx: Context, interaction: Interaction) {
    let Interaction::Command(command) = interaction else {
        return;
    };

    if let Err(e) = command.defer_ephemeral(&ctx.http).await {
        tracing::error!("Failed to defer /{}: {}", command.data.name, e);
        return;
    }

    let invocation = Invocation::from_command(&command, Utc::now());
    let reply = match command::run(state, &command.data.name, command.data.options(), &invocation)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            if !e.is_expected() {
                tracing::error!(
                    user_id = invocation.user_id,
                    command = %command.data.name,
                    "Command failed: {}",
                    e
                );
                state.audit.record(
                    AuditEvent::new(AuditChannel::Error, "command.failed", format!("/{}", command.data.name))
                        .actor(invocation.user_id)
                        .detail("error", &e),
                );
            }
            e.user_message()
        }
    };

    let response = EditInteractionResponse::new().content(truncate_reply(reply));
    if let Err(e) = command.edit_response(&ctx.http, response).await {
        tracing::error!("Failed to reply to /{}: {}", command.data.name, e);
    }
}
