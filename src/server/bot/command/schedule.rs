use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption, ResolvedOption};

use crate::server::{
    bot::command::{
        server::{string, subcommand},
        Invocation, Options,
    },
    error::AppError,
    model::schedule::{CreateScheduleParam, Schedule, ScheduleAction},
    service::schedule::ScheduleService,
    state::AppState,
};

const DEFAULT_TIMEZONE: &str = "UTC";

pub fn definition() -> CreateCommand {
    CreateCommand::new("schedule")
        .description("Start, stop or restart a server on a schedule")
        .add_option(
            subcommand("add", "Add a recurring action")
                .add_sub_option(string("server", "Server name"))
                .add_sub_option(
                    string("action", "What to do")
                        .add_string_choice("start", "start")
                        .add_string_choice("stop", "stop")
                        .add_string_choice("restart", "restart"),
                )
                .add_sub_option(string("cron", "Five-field cron expression, e.g. 0 18 * * *"))
                .add_sub_option(CreateCommandOption::new(
                    CommandOptionType::String,
                    "timezone",
                    "IANA timezone, e.g. Europe/Berlin (default UTC)",
                )),
        )
        .add_option(
            subcommand("list", "List a server's schedules")
                .add_sub_option(string("server", "Server name")),
        )
        .add_option(subcommand("enable", "Enable a schedule").add_sub_option(id_option()))
        .add_option(subcommand("disable", "Disable a schedule").add_sub_option(id_option()))
        .add_option(subcommand("delete", "Delete a schedule").add_sub_option(id_option()))
}

pub async fn run(
    state: &AppState,
    options: Vec<ResolvedOption<'_>>,
    invocation: &Invocation,
) -> Result<String, AppError> {
    let (subcommand, options) = Options::subcommand(options)?;
    let schedules = ScheduleService::new(&state.db, state.audit.as_ref());
    let owner = invocation.user_id;

    match subcommand {
        "add" => {
            let server = state
                .lifecycle()
                .registry()
                .find_owned(owner, options.string("server")?)
                .await?;
            let action_name = options.string("action")?;
            let action = ScheduleAction::parse(action_name).ok_or_else(|| {
                AppError::BadRequest(format!("Unknown action '{}'", action_name))
            })?;

            let schedule = schedules
                .create_schedule(
                    CreateScheduleParam {
                        server_id: server.id,
                        owner_id: owner,
                        action,
                        cron_expression: options.string("cron")?.to_string(),
                        timezone: options
                            .optional_string("timezone")
                            .unwrap_or(DEFAULT_TIMEZONE)
                            .to_string(),
                    },
                    invocation.now,
                )
                .await?;
            Ok(format!("Scheduled.\n{}", render_schedule(&schedule)))
        }
        "list" => {
            let server = state
                .lifecycle()
                .registry()
                .find_owned(owner, options.string("server")?)
                .await?;
            let list = schedules.get_server_schedules(server.id, owner).await?;
            if list.is_empty() {
                return Ok(format!("{} has no schedules.", server.name));
            }
            Ok(list
                .iter()
                .map(render_schedule)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "enable" => {
            let schedule = schedules
                .enable(schedule_id(&options)?, owner, invocation.now)
                .await?;
            Ok(format!("Enabled.\n{}", render_schedule(&schedule)))
        }
        "disable" => {
            let schedule = schedules.disable(schedule_id(&options)?, owner).await?;
            Ok(format!("Disabled.\n{}", render_schedule(&schedule)))
        }
        "delete" => {
            let id = schedule_id(&options)?;
            schedules.delete(id, owner).await?;
            Ok(format!("Deleted schedule #{}.", id))
        }
        other => Err(AppError::BadRequest(format!("Unknown subcommand '{}'", other))),
    }
}

fn render_schedule(schedule: &Schedule) -> String {
    let next = match (schedule.enabled, schedule.next_run) {
        (true, Some(next)) => format!("next {}", next.format("%Y-%m-%d %H:%M UTC")),
        (true, None) => "no upcoming run".to_string(),
        (false, _) => "disabled".to_string(),
    };

    format!(
        "#{} {} `{}` ({}) - {}",
        schedule.id, schedule.action, schedule.cron_expression, schedule.timezone, next
    )
}

fn schedule_id(options: &Options<'_>) -> Result<i32, AppError> {
    let id = options.integer("id")?;

    i32::try_from(id).map_err(|_| AppError::BadRequest(format!("Invalid schedule ID {}", id)))
}

fn id_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Integer, "id", "Schedule ID from /schedule list")
        .required(true)
}
