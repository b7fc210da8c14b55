//! Flowva Persistence - Local database, catalog cache, and encryption layer

pub mod cache;
pub mod encryption;
pub mod sqlite;
pub mod store;

pub use cache::CatalogCache;
pub use encryption::SessionCipher;
pub use sqlite::Database;
pub use store::LocalStore;
