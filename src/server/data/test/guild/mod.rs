use crate::server::{
    data::guild::GuildRepository,
    error::AppError,
    model::guild::CreateGuildParam,
};
use chrono::Utc;
use sea_orm::TransactionTrait;
use test_utils::{
    builder::TestBuilder,
    factory::{
        guild::GuildFactory,
        guild_member::create_guild_member,
        user::create_user,
    },
};

mod create;
mod deposit;
mod spend;
