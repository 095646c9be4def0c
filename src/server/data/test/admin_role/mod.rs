use crate::server::{
    data::admin_role::AdminRoleRepository, error::AppError, model::permission::Capability,
};
use chrono::Utc;
use test_utils::builder::TestBuilder;

mod grant;
