//! Data models for Flowva rewards entities

mod checkin;
mod profile;
mod quest;
mod redeemable;
mod wire;

pub use checkin::*;
pub use profile::*;
pub use quest::*;
pub use redeemable::*;
