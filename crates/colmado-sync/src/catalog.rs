//! # Catalog Cache
//!
//! The shared, stale-tolerant view of products and stock that every register
//! checks against. The cart itself is single-owner; the only cross-view races
//! that matter are stock decremented elsewhere and new products appearing
//! mid-session — both land here.
//!
//! ## Conflict Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Last Writer Wins, Dedup By Entity                     │
//! │                                                                         │
//! │  Products/Created ──► insert ONLY if the product id is absent.          │
//! │                       Replays of the same logical event are no-ops:    │
//! │                       dedup is by entity existence, NOT event id        │
//! │                       (events carry no global sequence).               │
//! │                                                                         │
//! │  Products/Updated ──► unconditional overwrite. Whichever write          │
//! │  Stock/StockSet   ──► applied last is kept; no vector clocks, no       │
//! │                       merge. Stock values are ABSOLUTE, so replays     │
//! │                       converge.                                        │
//! │                                                                         │
//! │  Freshness: entries touched by sync carry a transient "just changed"   │
//! │  flag for UI highlighting, cleared after 3s. The flag is NOT part of   │
//! │  identity and never participates in dedup.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use colmado_core::types::Product;
use tracing::{debug, warn};

use crate::bus::SyncHandler;
use crate::event::{Action, Channel, StockSetPayload, SyncEvent};

// =============================================================================
// Constants
// =============================================================================

/// How long the "just changed" highlight flag survives.
pub const FRESHNESS_TTL: Duration = Duration::from_secs(3);

// =============================================================================
// Cache Entry
// =============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    product: Product,
    /// Transient UI highlight marker. Not identity.
    just_changed: bool,
    /// Bumped on every touch so an in-flight clear timer for an older touch
    /// cannot wipe a newer flag.
    freshness_gen: u64,
}

// =============================================================================
// Catalog Cache
// =============================================================================

/// Last-writer-wins product/stock cache. Cheap to clone.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Arc<Mutex<HashMap<String, CacheEntry>>>,
    freshness_ttl: Duration,
}

impl CatalogCache {
    /// Creates an empty cache with the default freshness TTL.
    pub fn new() -> Self {
        Self::with_freshness_ttl(FRESHNESS_TTL)
    }

    /// Creates an empty cache with an explicit freshness TTL.
    pub fn with_freshness_ttl(freshness_ttl: Duration) -> Self {
        CatalogCache {
            inner: Arc::new(Mutex::new(HashMap::new())),
            freshness_ttl,
        }
    }

    /// Seeds the cache from a catalog listing. Seeded entries are not marked
    /// fresh — freshness highlights sync changes, not initial load.
    pub fn seed(&self, products: Vec<Product>) {
        let mut map = self.lock();
        for product in products {
            map.insert(
                product.id.clone(),
                CacheEntry {
                    product,
                    just_changed: false,
                    freshness_gen: 0,
                },
            );
        }
    }

    /// Returns a product by id.
    pub fn get(&self, product_id: &str) -> Option<Product> {
        self.lock().get(product_id).map(|e| e.product.clone())
    }

    /// Returns the last-known stock for a product.
    ///
    /// This is a CACHE: the figure may be stale until the next sync event.
    pub fn stock_of(&self, product_id: &str) -> Option<i64> {
        self.lock().get(product_id).map(|e| e.product.current_stock)
    }

    /// Number of cached products.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Ids of entries still carrying the "just changed" highlight.
    pub fn recently_changed(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(_, e)| e.just_changed)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned catalog lock means a panicked writer; the map itself is
        // still coherent for LWW semantics, so keep serving it.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Marks an entry fresh and schedules the flag clear.
    fn mark_fresh(&self, product_id: &str) {
        let generation = {
            let mut map = self.lock();
            match map.get_mut(product_id) {
                Some(entry) => {
                    entry.just_changed = true;
                    entry.freshness_gen += 1;
                    entry.freshness_gen
                }
                None => return,
            }
        };

        let inner = Arc::clone(&self.inner);
        let ttl = self.freshness_ttl;
        let id = product_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut map = match inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(entry) = map.get_mut(&id) {
                // Only clear if no newer touch re-marked the entry.
                if entry.freshness_gen == generation {
                    entry.just_changed = false;
                }
            }
        });
    }

    /// Applies one sync event to the cache.
    pub fn apply(&self, event: &SyncEvent) {
        match (event.channel, event.action) {
            (Channel::Products, Action::Created) => {
                let product: Product = match event.payload_as() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(?e, "Malformed product payload - event skipped");
                        return;
                    }
                };
                let id = product.id.clone();
                {
                    let mut map = self.lock();
                    if map.contains_key(&id) {
                        // Replay of an already-known creation: idempotent no-op.
                        debug!(product_id = %id, "Duplicate product-created event ignored");
                        return;
                    }
                    map.insert(
                        id.clone(),
                        CacheEntry {
                            product,
                            just_changed: false,
                            freshness_gen: 0,
                        },
                    );
                }
                self.mark_fresh(&id);
            }
            (Channel::Products, Action::Updated) => {
                let product: Product = match event.payload_as() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(?e, "Malformed product payload - event skipped");
                        return;
                    }
                };
                let id = product.id.clone();
                {
                    let mut map = self.lock();
                    // Last writer wins: unconditional upsert.
                    let entry = map.entry(id.clone()).or_insert_with(|| CacheEntry {
                        product: product.clone(),
                        just_changed: false,
                        freshness_gen: 0,
                    });
                    entry.product = product;
                }
                self.mark_fresh(&id);
            }
            (Channel::Products, Action::Deleted) => {
                #[derive(serde::Deserialize)]
                struct ProductRef {
                    id: String,
                }
                if let Ok(reference) = event.payload_as::<ProductRef>() {
                    self.lock().remove(&reference.id);
                }
            }
            (Channel::Stock, Action::StockSet) => {
                let payload: StockSetPayload = match event.payload_as() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(?e, "Malformed stock payload - event skipped");
                        return;
                    }
                };
                let known = {
                    let mut map = self.lock();
                    match map.get_mut(&payload.product_id) {
                        Some(entry) => {
                            entry.product.current_stock = payload.stock;
                            true
                        }
                        None => false,
                    }
                };
                if known {
                    self.mark_fresh(&payload.product_id);
                } else {
                    debug!(product_id = %payload.product_id, "Stock event for unknown product");
                }
            }
            _ => {
                // Sales/Customers traffic is for other consumers.
            }
        }
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        CatalogCache::new()
    }
}

impl SyncHandler for CatalogCache {
    fn handle(&self, event: &SyncEvent) {
        self.apply(event);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category_id: None,
            price_cents: 11800,
            tax_rate_bps: 1800,
            current_stock: stock,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_created_event_inserts_once() {
        let cache = CatalogCache::new();
        let event = SyncEvent::product_created(&product("p1", 5), "other-view").unwrap();

        cache.apply(&event);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stock_of("p1"), Some(5));
    }

    #[tokio::test]
    async fn test_created_replay_does_not_duplicate() {
        let cache = CatalogCache::new();
        cache.seed(vec![product("p1", 5)]);

        // Replay of a creation the cache already knows about: the existing
        // entry (including its stock) must survive untouched.
        let replay = SyncEvent::product_created(&product("p1", 99), "other-view").unwrap();
        cache.apply(&replay);
        cache.apply(&replay);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stock_of("p1"), Some(5));
    }

    #[tokio::test]
    async fn test_updated_is_last_writer_wins() {
        let cache = CatalogCache::new();
        cache.seed(vec![product("p1", 5)]);

        let mut newer = product("p1", 5);
        newer.price_cents = 12500;
        let event = SyncEvent::product_updated(&newer, "other-view").unwrap();
        cache.apply(&event);

        assert_eq!(cache.get("p1").unwrap().price_cents, 12500);
    }

    #[tokio::test]
    async fn test_stock_set_overwrites_absolute_value() {
        let cache = CatalogCache::new();
        cache.seed(vec![product("p1", 10)]);

        cache.apply(&SyncEvent::stock_set("p1", 7, "other-view"));
        assert_eq!(cache.stock_of("p1"), Some(7));

        // Replayed/reordered events converge because values are absolute.
        cache.apply(&SyncEvent::stock_set("p1", 7, "other-view"));
        assert_eq!(cache.stock_of("p1"), Some(7));
    }

    #[tokio::test]
    async fn test_stock_for_unknown_product_is_skipped() {
        let cache = CatalogCache::new();
        cache.apply(&SyncEvent::stock_set("ghost", 7, "other-view"));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_freshness_flag_clears_after_ttl() {
        let cache = CatalogCache::new();
        cache.seed(vec![product("p1", 10)]);

        cache.apply(&SyncEvent::stock_set("p1", 7, "other-view"));
        assert_eq!(cache.recently_changed(), vec!["p1".to_string()]);

        tokio::time::advance(FRESHNESS_TTL + Duration::from_millis(10)).await;
        settle().await;

        assert!(cache.recently_changed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_freshness_retouch_extends_highlight() {
        let cache = CatalogCache::new();
        cache.seed(vec![product("p1", 10)]);

        cache.apply(&SyncEvent::stock_set("p1", 7, "other-view"));
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;

        // Second touch before the first timer fires.
        cache.apply(&SyncEvent::stock_set("p1", 6, "other-view"));
        tokio::time::advance(Duration::from_millis(1500)).await;
        settle().await;

        // First timer has fired by now but must not clear the newer touch.
        assert_eq!(cache.recently_changed(), vec!["p1".to_string()]);

        tokio::time::advance(FRESHNESS_TTL).await;
        settle().await;
        assert!(cache.recently_changed().is_empty());
    }

    #[tokio::test]
    async fn test_freshness_not_part_of_identity() {
        let cache = CatalogCache::new();
        cache.seed(vec![product("p1", 10)]);
        cache.apply(&SyncEvent::stock_set("p1", 7, "other-view"));

        // The flag is purely presentational: reads return the product as-is
        // and dedup still keys on the id alone.
        let replay = SyncEvent::product_created(&product("p1", 42), "other-view").unwrap();
        cache.apply(&replay);
        assert_eq!(cache.stock_of("p1"), Some(7));
    }
}
