mod admin_role;
mod game_server;
mod guild;
mod pricing;
mod schedule;
mod user;
