use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption, ResolvedOption};

use crate::server::{
    bot::command::{Invocation, Options},
    error::AppError,
    model::game_server::{GameServer, StopOutcome},
    service::pricing::PricingService,
    state::AppState,
};

pub fn definition() -> CreateCommand {
    CreateCommand::new("server")
        .description("Manage your game servers")
        .add_option(
            subcommand("create", "Create and start a new server")
                .add_sub_option(string("game", "Game type, see /server types"))
                .add_sub_option(string("name", "Server name")),
        )
        .add_option(subcommand("list", "List your servers"))
        .add_option(subcommand("info", "Show one server").add_sub_option(name()))
        .add_option(subcommand("start", "Start a stopped server").add_sub_option(name()))
        .add_option(subcommand("stop", "Stop a server").add_sub_option(name()))
        .add_option(
            subcommand("restart", "Restart a running server for a small fee")
                .add_sub_option(name()),
        )
        .add_option(
            subcommand("delete", "Request deletion of a stopped server").add_sub_option(name()),
        )
        .add_option(
            subcommand("confirm", "Confirm a pending deletion")
                .add_sub_option(string("token", "Token from /server delete")),
        )
        .add_option(
            subcommand("public", "List or unlist a server in the lobby")
                .add_sub_option(name())
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Boolean,
                        "visible",
                        "Show the server in the public lobby",
                    )
                    .required(true),
                ),
        )
        .add_option(subcommand("lobby", "List public servers"))
        .add_option(subcommand("types", "List game types and prices"))
}

pub async fn run(
    state: &AppState,
    options: Vec<ResolvedOption<'_>>,
    invocation: &Invocation,
) -> Result<String, AppError> {
    let (subcommand, options) = Options::subcommand(options)?;
    let lifecycle = state.lifecycle();
    let registry = lifecycle.registry();
    let owner = invocation.user_id;
    let now = invocation.now;

    match subcommand {
        "create" => {
            let server = lifecycle
                .create(owner, options.string("game")?, options.string("name")?, now)
                .await?;
            Ok(format!(
                "Created {}. Charged {} credits for the first hour.\n{}",
                server.name,
                server.cost_per_hour,
                render_server(&server)
            ))
        }
        "list" => {
            let servers = registry.list_by_owner(owner).await?;
            Ok(render_list("You have no servers.", &servers))
        }
        "info" => {
            let server = registry.find_owned(owner, options.string("name")?).await?;
            Ok(render_server(&server))
        }
        "start" => {
            let server = registry.find_owned(owner, options.string("name")?).await?;
            let started = lifecycle.start(&server, Some(owner), now).await?;
            Ok(format!("Started {}.\n{}", started.name, render_server(&started)))
        }
        "stop" => {
            let server = registry.find_owned(owner, options.string("name")?).await?;
            Ok(match lifecycle.stop(&server, Some(owner), now).await? {
                StopOutcome::AlreadyStopped(server) => format!("{} is already stopped.", server.name),
                outcome => format!("Stopped {}.", outcome.server().name),
            })
        }
        "restart" => {
            let server = registry.find_owned(owner, options.string("name")?).await?;
            let restarted = lifecycle.restart(&server, Some(owner), now).await?;
            Ok(format!(
                "Restarting {}.\n{}",
                restarted.name,
                render_server(&restarted)
            ))
        }
        "delete" => {
            let confirmation = lifecycle
                .request_delete(owner, options.string("name")?, now)
                .await?;
            Ok(format!(
                "Deleting {} cannot be undone. Run `/server confirm token:{}` before {} to confirm.",
                confirmation.server.name,
                confirmation.token,
                confirmation.expires_at.format("%H:%M UTC")
            ))
        }
        "confirm" => {
            let server = lifecycle
                .confirm_delete(owner, options.string("token")?, now)
                .await?;
            Ok(format!("Deleted {}.", server.name))
        }
        "public" => {
            let server = registry.find_owned(owner, options.string("name")?).await?;
            let visible = options.boolean("visible")?;
            let server = registry.set_public(&server, owner, visible).await?;
            Ok(if server.is_public {
                format!("{} is now listed in the lobby.", server.name)
            } else {
                format!("{} is no longer listed in the lobby.", server.name)
            })
        }
        "lobby" => {
            let servers = registry.list_public().await?;
            Ok(render_list("No public servers right now.", &servers))
        }
        "types" => {
            let catalog = PricingService::new(&state.db, state.audit.as_ref())
                .list_catalog()
                .await?;
            if catalog.is_empty() {
                return Ok("No game types are available.".to_string());
            }
            Ok(catalog
                .iter()
                .map(|entry| {
                    format!(
                        "{} ({}): {} credits/hour, {} credits to start. {}",
                        entry.display_name,
                        entry.game_type,
                        entry.cost_per_hour,
                        entry.required_balance(),
                        entry.description
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        other => Err(AppError::BadRequest(format!("Unknown subcommand '{}'", other))),
    }
}

/// One-line summary of a server.
pub fn render_server(server: &GameServer) -> String {
    let mut line = format!(
        "#{} {} [{}] {} - {} credits/hour",
        server.id, server.name, server.game_type, server.status, server.cost_per_hour
    );

    if let Some(address) = server.connect_address() {
        line.push_str(&format!(" - {}", address));
    }
    if let Some(guild) = &server.guild_id {
        line.push_str(&format!(" - guild {}", guild));
    }
    if server.is_public {
        line.push_str(" - public");
    }
    if let Some(error) = &server.error_message {
        line.push_str(&format!(" - error: {}", error));
    }

    line
}

pub fn render_list(empty: &str, servers: &[GameServer]) -> String {
    if servers.is_empty() {
        return empty.to_string();
    }

    servers
        .iter()
        .map(render_server)
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn subcommand(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::SubCommand, name, description)
}

pub(super) fn string(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, name, description).required(true)
}

fn name() -> CreateCommandOption {
    string("name", "Server name")
}
