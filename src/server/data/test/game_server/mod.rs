use crate::server::{
    data::game_server::GameServerRepository,
    error::AppError,
    model::game_server::{CreateServerParam, ProvisionedAddress, ServerStatus, StatusChange},
};
use chrono::{Duration, Utc};
use test_utils::{
    builder::TestBuilder,
    factory::{
        game_server::{create_server, GameServerFactory},
        user::create_user,
    },
};

mod create;
mod list_stopped_before;
mod set_public;
mod transition;
