//! Discord bot integration.
//!
//! The bot is the platform's user interface: it registers the slash commands on
//! connect and answers each interaction by calling the core services. It runs in its
//! own tokio task next to the HTTP server and the scheduler.
//!
//! Only the `GUILDS` gateway intent is needed; slash commands arrive as interactions
//! regardless of intents.

pub mod command;
pub mod handler;
pub mod start;
