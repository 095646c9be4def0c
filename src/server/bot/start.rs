use serenity::all::{Client, GatewayIntents};

use crate::server::{bot::handler::Handler, config::Config, error::AppError, state::AppState};

/// Builds the Discord client with the command handler attached.
///
/// # Arguments
/// - `config` - Application configuration holding the bot token
/// - `state` - Shared application state handed to every command
///
/// # Returns
/// - `Ok(Client)` - Client ready to connect
/// - `Err(AppError::DiscordErr)` - Client construction failed
pub async fn init_bot(config: &Config, state: AppState) -> Result<Client, AppError> {
    let intents = GatewayIntents::GUILDS;

    let client = Client::builder(&config.discord_bot_token, intents)
        .event_handler(Handler::new(state))
        .await?;

    Ok(client)
}

/// Connects the bot and processes events until shutdown.
///
/// Call from a spawned task; this only returns when the gateway connection ends.
pub async fn start_bot(mut client: Client) -> Result<(), AppError> {
    tracing::info!("Starting Discord bot");

    client.start().await?;

    Ok(())
}
