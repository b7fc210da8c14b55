//! In-memory caching for the static reward catalogs

use flowva_core::{QuestRow, RedeemableRow};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cached item with expiration
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Thread-safe cache for the quest and redeemable catalogs with TTL.
///
/// Both catalogs are static from the client's point of view, so a short TTL
/// saves a round trip on every dashboard refresh.
pub struct CatalogCache {
    quests: RwLock<Option<CacheEntry<Vec<QuestRow>>>>,
    redeemables: RwLock<Option<CacheEntry<Vec<RedeemableRow>>>>,
    default_ttl: Duration,
}

impl CatalogCache {
    /// Create a new cache with the given TTL
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            quests: RwLock::new(None),
            redeemables: RwLock::new(None),
            default_ttl,
        }
    }

    /// Get the quest catalog from cache if not expired
    pub fn get_quests(&self) -> Option<Vec<QuestRow>> {
        let slot = self.quests.read().ok()?;
        let entry = slot.as_ref()?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Store the quest catalog
    pub fn put_quests(&self, rows: Vec<QuestRow>) {
        if let Ok(mut slot) = self.quests.write() {
            *slot = Some(CacheEntry {
                value: rows,
                inserted_at: Instant::now(),
                ttl: self.default_ttl,
            });
        }
    }

    /// Get the redeemables catalog from cache if not expired
    pub fn get_redeemables(&self) -> Option<Vec<RedeemableRow>> {
        let slot = self.redeemables.read().ok()?;
        let entry = slot.as_ref()?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Store the redeemables catalog
    pub fn put_redeemables(&self, rows: Vec<RedeemableRow>) {
        if let Ok(mut slot) = self.redeemables.write() {
            *slot = Some(CacheEntry {
                value: rows,
                inserted_at: Instant::now(),
                ttl: self.default_ttl,
            });
        }
    }

    /// Drop both catalogs (e.g. after switching accounts)
    pub fn clear(&self) {
        if let Ok(mut slot) = self.quests.write() {
            *slot = None;
        }
        if let Ok(mut slot) = self.redeemables.write() {
            *slot = None;
        }
    }

    /// Drop expired entries so they do not pin memory
    pub fn cleanup(&self) {
        if let Ok(mut slot) = self.quests.write() {
            if slot.as_ref().is_some_and(CacheEntry::is_expired) {
                *slot = None;
            }
        }
        if let Ok(mut slot) = self.redeemables.write() {
            if slot.as_ref().is_some_and(CacheEntry::is_expired) {
                *slot = None;
            }
        }
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        // Catalog edits are rare; 5 minutes keeps the dashboard snappy
        Self::new(Duration::from_secs(300))
    }
}
