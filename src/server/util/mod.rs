//! Small parsing and formatting helpers shared by the data and service layers.

pub mod parse;
pub mod slug;
