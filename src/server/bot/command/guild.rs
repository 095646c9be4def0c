use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption, ResolvedOption};

use crate::server::{
    bot::command::{
        server::{render_server, string, subcommand},
        Invocation, Options,
    },
    error::AppError,
    service::guild_treasury::GuildTreasuryService,
    state::AppState,
};

pub fn definition() -> CreateCommand {
    CreateCommand::new("guild")
        .description("Pool credits with other players")
        .add_option(
            subcommand("create", "Create a guild you own")
                .add_sub_option(string("name", "Guild display name")),
        )
        .add_option(
            subcommand("invite", "Add a player to your guild")
                .add_sub_option(guild_option())
                .add_sub_option(
                    CreateCommandOption::new(CommandOptionType::User, "user", "Player to add")
                        .required(true),
                ),
        )
        .add_option(
            subcommand("deposit", "Move credits into the guild treasury")
                .add_sub_option(guild_option())
                .add_sub_option(
                    CreateCommandOption::new(CommandOptionType::Integer, "amount", "Credits")
                        .min_int_value(1)
                        .required(true),
                ),
        )
        .add_option(subcommand("info", "Show a guild treasury").add_sub_option(guild_option()))
        .add_option(subcommand("list", "List your guilds"))
        .add_option(
            subcommand("server", "Create a server paid by the guild")
                .add_sub_option(guild_option())
                .add_sub_option(string("game", "Game type, see /server types"))
                .add_sub_option(string("name", "Server name")),
        )
}

pub async fn run(
    state: &AppState,
    options: Vec<ResolvedOption<'_>>,
    invocation: &Invocation,
) -> Result<String, AppError> {
    let (subcommand, options) = Options::subcommand(options)?;
    let treasury = GuildTreasuryService::new(&state.db, state.audit.as_ref());
    let user = invocation.user_id;
    let now = invocation.now;

    match subcommand {
        "create" => {
            let guild = treasury
                .create_guild(options.string("name")?, user, now)
                .await?;
            Ok(format!(
                "Created guild {} with ID `{}`. Use the ID in other /guild commands.",
                guild.display_name, guild.id
            ))
        }
        "invite" => {
            let guild_id = options.string("guild")?;
            let target = options.user("user")?;
            let inviter_is_admin = invocation.is_platform_admin(state).await?;
            treasury
                .add_member(guild_id, target, user, inviter_is_admin, now)
                .await?;
            Ok(format!("Added <@{}> to `{}`.", target, guild_id))
        }
        "deposit" => {
            let guild = treasury
                .deposit(options.string("guild")?, user, options.integer("amount")?, now)
                .await?;
            Ok(format!(
                "Deposited. {} treasury: {} credits.",
                guild.display_name, guild.balance
            ))
        }
        "info" => {
            let guild_id = options.string("guild")?;
            let guild = treasury.get_guild(guild_id).await?;
            let members = treasury.get_members(guild_id).await?;
            let mut reply = format!(
                "{} (`{}`), owner <@{}>\nBalance: {} credits (deposited {}, spent {})\nMembers: {}",
                guild.display_name,
                guild.id,
                guild.owner_id,
                guild.balance,
                guild.total_deposits,
                guild.total_spent,
                guild.member_count
            );
            for member in members {
                reply.push_str(&format!(
                    "\n<@{}>: deposited {}",
                    member.user_id, member.total_deposits
                ));
            }
            Ok(reply)
        }
        "list" => {
            let guilds = treasury.list_for_user(user).await?;
            if guilds.is_empty() {
                return Ok("You are not in any guild.".to_string());
            }
            Ok(guilds
                .iter()
                .map(|guild| {
                    format!(
                        "{} (`{}`): {} credits",
                        guild.display_name, guild.id, guild.balance
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "server" => {
            let server = state
                .lifecycle()
                .create_for_guild(
                    options.string("guild")?,
                    user,
                    options.string("game")?,
                    options.string("name")?,
                    now,
                )
                .await?;
            Ok(format!(
                "Created {} on the guild treasury.\n{}",
                server.name,
                render_server(&server)
            ))
        }
        other => Err(AppError::BadRequest(format!("Unknown subcommand '{}'", other))),
    }
}

fn guild_option() -> CreateCommandOption {
    string("guild", "Guild ID")
}
