//! Moderator and administrator commands.
//!
//! Every subcommand checks the invoker's capability before touching anything. Read-only
//! fleet views and status overrides need moderator; money, pricing and role
//! configuration need admin.

use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption, ResolvedOption};

use crate::server::{
    bot::command::{
        server::{render_list, render_server, string, subcommand},
        Invocation, Options,
    },
    error::AppError,
    model::{
        game_server::{ServerStatus, StopOutcome},
        permission::Capability,
        pricing::{AddGameTypeParam, PricingEntry},
        user::Tier,
    },
    service::{
        guild_treasury::GuildTreasuryService, ledger::LedgerService,
        permission::PermissionService, pricing::PricingService,
    },
    state::AppState,
};

pub fn definition() -> CreateCommand {
    let status_choices = ServerStatus::all()
        .into_iter()
        .fold(string("status", "New status"), |option, status| {
            option.add_string_choice(status.as_str(), status.as_str())
        });

    CreateCommand::new("admin")
        .description("Platform moderation and administration")
        .add_option(
            subcommand("credit", "Add or remove credits")
                .add_sub_option(user_option())
                .add_sub_option(integer("amount", "Credits, negative to debit")),
        )
        .add_option(
            subcommand("tier", "Change an account tier")
                .add_sub_option(user_option())
                .add_sub_option(
                    string("tier", "New tier")
                        .add_string_choice("free", "free")
                        .add_string_choice("premium", "premium"),
                ),
        )
        .add_option(
            subcommand("set-admin", "Grant or remove platform admin")
                .add_sub_option(user_option())
                .add_sub_option(
                    CreateCommandOption::new(CommandOptionType::Boolean, "enabled", "Admin flag")
                        .required(true),
                ),
        )
        .add_option(
            subcommand("servers", "List every server").add_sub_option(CreateCommandOption::new(
                CommandOptionType::String,
                "status",
                "Only servers in this status",
            )),
        )
        .add_option(
            subcommand("status", "Override a server status")
                .add_sub_option(integer("server", "Server ID"))
                .add_sub_option(status_choices),
        )
        .add_option(
            subcommand("stop", "Stop any server").add_sub_option(integer("server", "Server ID")),
        )
        .add_option(subcommand("cleanup", "List servers stopped past the retention window"))
        .add_option(subcommand("purge", "Delete servers stopped past the retention window"))
        .add_option(subcommand("pricing", "Show the full pricing table"))
        .add_option(
            subcommand("pricing-update", "Change a game type's price")
                .add_sub_option(string("game", "Game type"))
                .add_sub_option(integer("cost", "Credits per hour"))
                .add_sub_option(integer("min", "Minimum balance to create")),
        )
        .add_option(
            subcommand("pricing-add", "Add a game type")
                .add_sub_option(string("game", "Game type key"))
                .add_sub_option(string("display", "Display name"))
                .add_sub_option(integer("cost", "Credits per hour"))
                .add_sub_option(integer("min", "Minimum balance to create"))
                .add_sub_option(CreateCommandOption::new(
                    CommandOptionType::String,
                    "description",
                    "Short description",
                )),
        )
        .add_option(
            subcommand("pricing-disable", "Stop offering a game type")
                .add_sub_option(string("game", "Game type")),
        )
        .add_option(
            subcommand("pricing-enable", "Offer a disabled game type again")
                .add_sub_option(string("game", "Game type")),
        )
        .add_option(
            subcommand("role-grant", "Give a Discord role a capability")
                .add_sub_option(role_option())
                .add_sub_option(
                    string("level", "Capability")
                        .add_string_choice("moderator", "moderator")
                        .add_string_choice("admin", "admin"),
                ),
        )
        .add_option(
            subcommand("role-revoke", "Remove a Discord role's capability")
                .add_sub_option(role_option()),
        )
        .add_option(subcommand("roles", "List configured roles"))
        .add_option(
            subcommand("guild-spend", "Spend from a guild treasury")
                .add_sub_option(string("guild", "Guild ID"))
                .add_sub_option(integer("amount", "Credits")),
        )
}

pub async fn run(
    state: &AppState,
    options: Vec<ResolvedOption<'_>>,
    invocation: &Invocation,
) -> Result<String, AppError> {
    let (subcommand, options) = Options::subcommand(options)?;

    invocation.require(state, required_capability(subcommand)).await?;

    let actor = invocation.user_id;
    let now = invocation.now;
    let audit = state.audit.as_ref();
    let pricing = PricingService::new(&state.db, audit);
    let lifecycle = state.lifecycle();
    let registry = lifecycle.registry();

    match subcommand {
        "credit" => {
            let user = options.user("user")?;
            let account = LedgerService::new(&state.db, audit)
                .credit(user, options.integer("amount")?, Some(actor))
                .await?;
            Ok(format!("<@{}> now has {} credits.", user, account.balance))
        }
        "tier" => {
            let user = options.user("user")?;
            let tier_name = options.string("tier")?;
            let tier = Tier::parse(tier_name)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown tier '{}'", tier_name)))?;
            let account = LedgerService::new(&state.db, audit)
                .set_tier(actor, user, tier)
                .await?;
            Ok(format!("<@{}> is now {}.", user, account.tier))
        }
        "set-admin" => {
            let user = options.user("user")?;
            let enabled = options.boolean("enabled")?;
            PermissionService::new(&state.db, audit)
                .set_platform_admin(actor, user, enabled, now)
                .await?;
            Ok(if enabled {
                format!("<@{}> is now a platform admin.", user)
            } else {
                format!("<@{}> is no longer a platform admin.", user)
            })
        }
        "servers" => {
            let servers = match options.optional_string("status") {
                Some(name) => registry.list_by_status(&[parse_status(name)?]).await?,
                None => registry.list_all().await?,
            };
            Ok(render_list("No servers.", &servers))
        }
        "status" => {
            let status = parse_status(options.string("status")?)?;
            let server = registry
                .update_status(server_id(&options)?, status, actor, now)
                .await?;
            Ok(format!("Updated.\n{}", render_server(&server)))
        }
        "stop" => {
            let server = registry.get(server_id(&options)?).await?;
            Ok(match lifecycle.stop(&server, Some(actor), now).await? {
                StopOutcome::AlreadyStopped(server) => format!("{} is already stopped.", server.name),
                outcome => format!("Stopped {}.", outcome.server().name),
            })
        }
        "cleanup" => {
            let servers = registry.cleanup_candidates(now).await?;
            Ok(render_list("Nothing to clean up.", &servers))
        }
        "purge" => {
            let purged = lifecycle.purge_stopped(Some(actor), now).await?;
            Ok(format!("Purged {} servers.", purged.len()))
        }
        "pricing" => {
            let entries = pricing.get_all_pricing().await?;
            if entries.is_empty() {
                return Ok("The pricing table is empty.".to_string());
            }
            Ok(entries
                .iter()
                .map(render_pricing)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "pricing-update" => {
            let entry = pricing
                .update_pricing(
                    actor,
                    options.string("game")?,
                    options.integer("cost")?,
                    options.integer("min")?,
                )
                .await?;
            Ok(format!(
                "Updated. Existing servers keep their price.\n{}",
                render_pricing(&entry)
            ))
        }
        "pricing-add" => {
            let entry = pricing
                .add_game_type(
                    actor,
                    AddGameTypeParam {
                        game_type: options.string("game")?.to_string(),
                        display_name: options.string("display")?.to_string(),
                        description: options
                            .optional_string("description")
                            .unwrap_or_default()
                            .to_string(),
                        cost_per_hour: options.integer("cost")?,
                        min_credits: options.integer("min")?,
                    },
                )
                .await?;
            Ok(format!("Added.\n{}", render_pricing(&entry)))
        }
        "pricing-disable" => {
            let game = options.string("game")?;
            pricing.disable_game_type(actor, game).await?;
            Ok(format!("{} can no longer be created.", game))
        }
        "pricing-enable" => {
            let game = options.string("game")?;
            pricing.enable_game_type(actor, game).await?;
            Ok(format!("{} is available again.", game))
        }
        "role-grant" => {
            let guild_id = discord_guild(invocation)?;
            let role = options.role("role")?;
            let level_name = options.string("level")?;
            let level = Capability::parse(level_name)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown level '{}'", level_name)))?;
            PermissionService::new(&state.db, audit)
                .grant_role(actor, guild_id, role, level, now)
                .await?;
            Ok(format!("<@&{}> now has {}.", role, level))
        }
        "role-revoke" => {
            let guild_id = discord_guild(invocation)?;
            let role = options.role("role")?;
            PermissionService::new(&state.db, audit)
                .revoke_role(actor, guild_id, role)
                .await?;
            Ok(format!("<@&{}> no longer has a capability.", role))
        }
        "roles" => {
            let guild_id = discord_guild(invocation)?;
            let grants = PermissionService::new(&state.db, audit)
                .list_roles(guild_id)
                .await?;
            if grants.is_empty() {
                return Ok("No roles are configured.".to_string());
            }
            Ok(grants
                .iter()
                .map(|grant| format!("<@&{}>: {}", grant.role_id, grant.level))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "guild-spend" => {
            let guild = GuildTreasuryService::new(&state.db, audit)
                .spend(options.string("guild")?, options.integer("amount")?, Some(actor))
                .await?;
            Ok(format!(
                "{} treasury: {} credits.",
                guild.display_name, guild.balance
            ))
        }
        other => Err(AppError::BadRequest(format!("Unknown subcommand '{}'", other))),
    }
}

/// Capability a subcommand requires.
fn required_capability(subcommand: &str) -> Capability {
    match subcommand {
        "servers" | "status" | "stop" | "cleanup" | "pricing" | "roles" => Capability::Moderator,
        _ => Capability::Admin,
    }
}

fn render_pricing(entry: &PricingEntry) -> String {
    format!(
        "{} ({}): {} credits/hour, min {}{}",
        entry.display_name,
        entry.game_type,
        entry.cost_per_hour,
        entry.min_credits,
        if entry.is_active { "" } else { " - disabled" }
    )
}

fn parse_status(name: &str) -> Result<ServerStatus, AppError> {
    ServerStatus::parse(name).ok_or_else(|| AppError::BadRequest(format!("Unknown status '{}'", name)))
}

fn server_id(options: &Options<'_>) -> Result<i32, AppError> {
    let id = options.integer("server")?;

    i32::try_from(id).map_err(|_| AppError::BadRequest(format!("Invalid server ID {}", id)))
}

fn discord_guild(invocation: &Invocation) -> Result<u64, AppError> {
    invocation.member.guild_id.ok_or_else(|| {
        AppError::BadRequest("Role configuration only works inside a Discord server".to_string())
    })
}

fn integer(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Integer, name, description).required(true)
}

fn user_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::User, "user", "Player").required(true)
}

fn role_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Role, "role", "Discord role").required(true)
}
