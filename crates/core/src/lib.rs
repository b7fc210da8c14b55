//! Flowva Core - Shared data models, errors, and the rewards store interface

pub mod errors;
pub mod models;
pub mod store;

pub use errors::{Error, Result};
pub use models::*;
pub use store::RewardsStore;
