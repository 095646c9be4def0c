use crate::server::{
    data::schedule::ScheduleRepository,
    error::AppError,
    model::schedule::{CreateScheduleParam, ScheduleAction},
};
use chrono::{Duration, Utc};
use test_utils::{
    builder::TestBuilder,
    factory::{
        game_server::create_server,
        schedule::{create_schedule, ScheduleFactory},
        user::create_user,
    },
};

mod create;
mod find_due;
mod owner_scoped;
