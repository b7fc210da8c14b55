//! Daemon state shared across commands and the keeper loop

use flowva_persistence::{CatalogCache, Database, SessionCipher};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared daemon state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RwLock<Option<Database>>>,
    pub cipher: Arc<SessionCipher>,
    pub data_dir: PathBuf,
    /// Shared catalog cache for reducing API calls across commands and the keeper
    pub catalog_cache: Arc<CatalogCache>,
}

impl AppState {
    /// Create new daemon state
    pub fn new(data_dir: PathBuf, cipher: SessionCipher) -> Self {
        Self {
            db: Arc::new(RwLock::new(None)),
            cipher: Arc::new(cipher),
            data_dir,
            catalog_cache: Arc::new(CatalogCache::default()),
        }
    }

    /// Initialize the database connection
    pub async fn init_db(&self) -> Result<(), String> {
        let db_path = self.data_dir.join("flowva.db");
        let db = Database::connect(&db_path).await.map_err(|e| e.to_string())?;

        let mut db_lock = self.db.write().await;
        *db_lock = Some(db);

        Ok(())
    }
}
