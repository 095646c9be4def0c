pub mod api;
pub mod reward;
