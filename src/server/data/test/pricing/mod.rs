use crate::server::{
    data::pricing::PricingRepository,
    error::AppError,
    model::pricing::AddGameTypeParam,
};
use chrono::Utc;
use test_utils::{
    builder::TestBuilder,
    factory::pricing::{create_pricing, PricingFactory},
};

mod list;
mod update_price;
