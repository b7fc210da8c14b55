//! SQLite database management

mod connection;
mod profiles;
mod quests;
mod redeemables;
mod session;
mod settings;

pub use connection::Database;
pub use profiles::*;
pub use quests::*;
pub use redeemables::*;
pub use session::*;
pub use settings::*;
