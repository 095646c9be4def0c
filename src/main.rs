mod model;
mod server;

use crate::server::{
    bot, config::Config, error::AppError, router, scheduler::jobs, startup,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    startup::init_tracing(config.log_json);

    let db = startup::connect_to_database(&config).await?;
    let http_client = startup::setup_reqwest_client(&config)?;
    let discord_http = startup::setup_discord_http(&config);

    let state = startup::build_state(&config, db, http_client, discord_http);
    startup::seed_pricing(&state.db, state.audit.as_ref()).await?;

    let bot_client = bot::start::init_bot(&config, state.clone()).await?;
    tokio::spawn(async move {
        if let Err(e) = bot::start::start_bot(bot_client).await {
            tracing::error!("Discord bot error: {}", e);
        }
    });

    let _scheduler = jobs::start_scheduler(state.clone()).await?;

    let listener = tokio::net::TcpListener::bind(config.http_bind_addr)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to bind {}: {}", config.http_bind_addr, e)))?;
    tracing::info!("Listening on {}", config.http_bind_addr);

    axum::serve(listener, router::router().with_state(state))
        .await
        .map_err(|e| AppError::InternalError(format!("HTTP server error: {}", e)))?;

    Ok(())
}
