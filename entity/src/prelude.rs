pub use super::admin_role::Entity as AdminRole;
pub use super::game_server::Entity as GameServer;
pub use super::guild::Entity as Guild;
pub use super::guild_member::Entity as GuildMember;
pub use super::pricing::Entity as Pricing;
pub use super::schedule::Entity as Schedule;
pub use super::user::Entity as User;
