//! HTTP request handlers.
//!
//! The HTTP surface is small: a health check for the deployment and the callback the
//! ad network posts to after a verified rewarded-ad view. Everything else happens
//! through Discord slash commands.

pub mod reward;
pub mod system;
