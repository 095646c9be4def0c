use std::sync::Arc;

use serenity::http::Http;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::server::{
    audit::{discord::DiscordAuditSink, AuditSink},
    config::Config,
    error::AppError,
    orchestrator::http::HttpOrchestrator,
    service::pricing::PricingService,
    state::AppState,
};

const DEFAULT_LOG_FILTER: &str = "agis=info";

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and falls back to `agis=info`. With `json` set,
/// records are emitted as one JSON object per line.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connects to the Sqlite database and runs pending migrations.
///
/// Establishes a connection pool using the connection string from configuration, then
/// runs all pending SeaORM migrations so the schema is up to date before any service
/// touches it.
///
/// # Arguments
/// - `config` - Application configuration containing the database URL
///
/// # Returns
/// - `Ok(DatabaseConnection)` - Connected database with migrations applied
/// - `Err(AppError::DbErr)` - Failed to connect to database or run migrations
pub async fn connect_to_database(config: &Config) -> Result<sea_orm::DatabaseConnection, AppError> {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.sqlx_logging(false);

    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Builds the HTTP client used for orchestrator calls.
///
/// Redirects are disabled so a misbehaving endpoint cannot bounce requests elsewhere.
pub fn setup_reqwest_client(config: &Config) -> Result<reqwest::Client, AppError> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(config.orchestrator_timeout)
        .build()?;

    Ok(client)
}

/// Discord REST client shared by the audit sink and the bot.
pub fn setup_discord_http(config: &Config) -> Arc<Http> {
    Arc::new(Http::new(&config.discord_bot_token))
}

/// Seeds the default game types when the pricing catalog is empty.
pub async fn seed_pricing(db: &sea_orm::DatabaseConnection, audit: &dyn AuditSink) -> Result<(), AppError> {
    let seeded = PricingService::new(db, audit).seed_defaults().await?;

    if seeded > 0 {
        tracing::info!("Seeded {} default game types", seeded);
    }

    Ok(())
}

/// Wires the application state from configuration and the open connections.
pub fn build_state(
    config: &Config,
    db: sea_orm::DatabaseConnection,
    http_client: reqwest::Client,
    discord_http: Arc<Http>,
) -> AppState {
    let orchestrator = Arc::new(HttpOrchestrator::new(
        http_client.clone(),
        config.orchestrator_url.clone(),
        config.orchestrator_token.clone(),
    ));
    let audit: Arc<dyn AuditSink> = Arc::new(DiscordAuditSink::new(
        discord_http,
        config.log_channels.clone(),
    ));

    AppState::new(
        db,
        http_client,
        orchestrator.clone(),
        orchestrator,
        audit,
        config.orchestrator_timeout,
        config.ad_reward_secret.clone(),
    )
}
