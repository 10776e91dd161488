//! Time-boxed memoization of fetched content trees.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::content::block::Blocks;
use crate::portal::Portal;

/// How long a fetched tree stays fresh by default.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    fetched_at: Instant,
    tree: Arc<Blocks>,
}

/// Memoizes [`Portal::page_content`] per page id.
///
/// Content fetches are idempotent reads, so serving a tree fetched moments
/// ago is safe. Entries past the freshness window are refetched on access.
/// Two tasks missing the same page concurrently both fetch; the later insert
/// wins.
pub struct ContentCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ContentCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a page's content tree, served from the cache while fresh.
    pub async fn page_content(&self, portal: &Portal, page_id: &str) -> Arc<Blocks> {
        if let Some(tree) = self.fresh(page_id) {
            return tree;
        }
        let tree = Arc::new(portal.page_content(page_id).await);
        self.lock().insert(
            page_id.to_string(),
            CacheEntry {
                fetched_at: Instant::now(),
                tree: Arc::clone(&tree),
            },
        );
        tree
    }

    /// Drop one page's entry, forcing the next read to refetch.
    pub fn invalidate(&self, page_id: &str) {
        self.lock().remove(page_id);
    }

    /// Drop every entry past its freshness window.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.lock()
            .retain(|_, entry| entry.fetched_at.elapsed() < ttl);
    }

    fn fresh(&self, page_id: &str) -> Option<Arc<Blocks>> {
        let entries = self.lock();
        let entry = entries.get(page_id)?;
        (entry.fetched_at.elapsed() < self.ttl).then(|| Arc::clone(&entry.tree))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::DatabaseIds;
    use crate::store::memory::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Portal) {
        let store = Arc::new(MemoryStore::new());
        store.seed_block(
            "page-1",
            "paragraph",
            json!({ "rich_text": [{ "plain_text": "Documentation" }] }),
        );
        let databases = DatabaseIds {
            clients: "db-clients".to_string(),
            projects: "db-projets".to_string(),
            deliverables: "db-livrables".to_string(),
            invoices: "db-factures".to_string(),
            validations: "db-validations".to_string(),
            comments: None,
        };
        let portal = Portal::new(store.clone(), databases);
        (store, portal)
    }

    #[tokio::test]
    async fn fresh_entries_are_served_without_refetching() {
        let (store, portal) = setup();
        let cache = ContentCache::default();

        let first = cache.page_content(&portal, "page-1").await;
        let second = cache.page_content(&portal, "page-1").await;
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let (store, portal) = setup();
        let cache = ContentCache::new(Duration::ZERO);

        cache.page_content(&portal, "page-1").await;
        cache.page_content(&portal, "page-1").await;
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn invalidation_forces_a_refetch() {
        let (store, portal) = setup();
        let cache = ContentCache::default();

        cache.page_content(&portal, "page-1").await;
        cache.invalidate("page-1");
        cache.page_content(&portal, "page-1").await;
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn purge_keeps_fresh_entries() {
        let (store, portal) = setup();
        let cache = ContentCache::default();

        cache.page_content(&portal, "page-1").await;
        cache.purge_expired();
        cache.page_content(&portal, "page-1").await;
        assert_eq!(store.list_calls(), 1);

        let expiring = ContentCache::new(Duration::ZERO);
        expiring.page_content(&portal, "page-1").await;
        expiring.purge_expired();
        expiring.page_content(&portal, "page-1").await;
        assert_eq!(store.list_calls(), 3);
    }
}
