//! In-memory workspace store backing the test suite

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::properties::{self, PropertyMap};
use crate::store::{BlockRecord, DatabaseQuery, PageRecord, Paged, WorkspaceStore};

/// Fake store holding pages and block trees in memory
///
/// Interprets exactly the filter and sort clauses the portal's query
/// builders emit. Listings are paginated with a configurable page size so
/// cursor handling is exercised, and per-block failures can be injected.
#[derive(Debug)]
pub struct MemoryStore {
    pages: Mutex<BTreeMap<String, PageRecord>>,
    memberships: Mutex<BTreeMap<String, String>>,
    children: Mutex<BTreeMap<String, Vec<BlockRecord>>>,
    fail_plan: Mutex<HashMap<String, usize>>,
    list_calls: AtomicUsize,
    page_size: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    /// Create a store that serves listings in pages of `page_size`
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            pages: Mutex::new(BTreeMap::new()),
            memberships: Mutex::new(BTreeMap::new()),
            children: Mutex::new(BTreeMap::new()),
            fail_plan: Mutex::new(HashMap::new()),
            list_calls: AtomicUsize::new(0),
            page_size,
        }
    }

    /// Seed a database page and return its minted id
    pub fn seed_page(
        &self,
        database_id: &str,
        created_time: &str,
        properties: PropertyMap,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.seed_page_with_id(&id, database_id, created_time, properties);
        id
    }

    /// Seed a database page under a caller-chosen id
    pub fn seed_page_with_id(
        &self,
        id: &str,
        database_id: &str,
        created_time: &str,
        properties: PropertyMap,
    ) {
        let record = PageRecord {
            id: id.to_string(),
            created_time: created_time.to_string(),
            last_edited_time: created_time.to_string(),
            properties,
        };
        lock(&self.pages).insert(id.to_string(), record);
        lock(&self.memberships).insert(id.to_string(), database_id.to_string());
    }

    /// Seed a content block under a parent and return its minted id
    ///
    /// `payload` is the object served under the block's type key. Parents
    /// report `has_children` automatically once a block is seeded below them.
    pub fn seed_block(&self, parent_id: &str, kind: &str, payload: Value) -> String {
        let id = Uuid::new_v4().to_string();
        let record = BlockRecord::new(&id, kind, payload);
        lock(&self.children)
            .entry(parent_id.to_string())
            .or_default()
            .push(record);
        id
    }

    /// Make every `list_children` call for `block_id` fail
    pub fn fail_children_of(&self, block_id: &str) {
        self.fail_children_after(block_id, 0);
    }

    /// Make `list_children` for `block_id` fail once `successful_calls`
    /// pages have been served
    pub fn fail_children_after(&self, block_id: &str, successful_calls: usize) {
        lock(&self.fail_plan).insert(block_id.to_string(), successful_calls);
    }

    /// Number of `list_children` calls served so far, failures included
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkspaceStore for MemoryStore {
    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> StoreResult<Paged<BlockRecord>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        {
            let mut plan = lock(&self.fail_plan);
            if let Some(left) = plan.get_mut(block_id) {
                if *left == 0 {
                    return Err(StoreError::other(format!(
                        "injected failure listing {block_id}"
                    )));
                }
                *left -= 1;
            }
        }

        let children = lock(&self.children);
        let blocks: &[BlockRecord] = children.get(block_id).map_or(&[], Vec::as_slice);
        let offset = cursor
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or_default()
            .min(blocks.len());
        let end = (offset + self.page_size).min(blocks.len());
        let results = blocks[offset..end]
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.has_children = children
                    .get(&record.id)
                    .is_some_and(|kids| !kids.is_empty());
                record
            })
            .collect();
        let has_more = end < blocks.len();
        Ok(Paged {
            results,
            has_more,
            next_cursor: has_more.then(|| end.to_string()),
        })
    }

    async fn retrieve_page(&self, page_id: &str) -> StoreResult<PageRecord> {
        lock(&self.pages)
            .get(page_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(page_id))
    }

    async fn query_database(
        &self,
        database_id: &str,
        query: DatabaseQuery,
    ) -> StoreResult<Paged<PageRecord>> {
        let memberships = lock(&self.memberships);
        let pages = lock(&self.pages);
        let mut results: Vec<PageRecord> = pages
            .values()
            .filter(|page| memberships.get(&page.id).is_some_and(|db| db == database_id))
            .filter(|page| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|clause| matches_filter(page, clause))
            })
            .cloned()
            .collect();
        if let Some(sort) = query.sorts.first() {
            apply_sort(&mut results, sort);
        }
        Ok(Paged::complete(results))
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: PropertyMap,
    ) -> StoreResult<PageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let record = PageRecord {
            id: id.clone(),
            created_time: now.clone(),
            last_edited_time: now,
            properties,
        };
        lock(&self.pages).insert(id.clone(), record.clone());
        lock(&self.memberships).insert(id, database_id.to_string());
        Ok(record)
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: PropertyMap,
    ) -> StoreResult<PageRecord> {
        let mut pages = lock(&self.pages);
        let record = pages
            .get_mut(page_id)
            .ok_or_else(|| StoreError::not_found(page_id))?;
        for (name, value) in properties {
            record.properties.insert(name, value);
        }
        record.last_edited_time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Ok(record.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn matches_filter(page: &PageRecord, clause: &Value) -> bool {
    if let Some(clauses) = clause["and"].as_array() {
        return clauses.iter().all(|c| matches_filter(page, c));
    }
    if let Some(clauses) = clause["or"].as_array() {
        return clauses.iter().any(|c| matches_filter(page, c));
    }
    let Some(property) = clause["property"].as_str() else {
        return false;
    };
    let names = [property];
    let props = &page.properties;
    if let Some(id) = clause["relation"]["contains"].as_str() {
        return properties::relation(props, &names).iter().any(|r| r == id);
    }
    if let Some(value) = clause["checkbox"]["equals"].as_bool() {
        return properties::checkbox(props, &names) == value;
    }
    if let Some(value) = clause["email"]["equals"].as_str() {
        return properties::email(props, &names) == value;
    }
    if let Some(value) = clause["rich_text"]["equals"].as_str() {
        return properties::rich_text(props, &names) == value;
    }
    if let Some(value) = clause["status"]["equals"].as_str() {
        return properties::status_or_select(props, &names) == value;
    }
    false
}

fn apply_sort(results: &mut [PageRecord], sort: &Value) {
    if sort["timestamp"].as_str() == Some("created_time") {
        results.sort_by(|a, b| a.created_time.cmp(&b.created_time));
    } else if let Some(property) = sort["property"].as_str() {
        results.sort_by(|a, b| sort_key(a, property).cmp(&sort_key(b, property)));
    }
    if sort["direction"].as_str() == Some("descending") {
        results.reverse();
    }
}

/// Date properties compare on their start, anything else on its title text;
/// ISO 8601 strings order chronologically either way
fn sort_key(page: &PageRecord, property: &str) -> String {
    properties::date(&page.properties, &[property])
        .unwrap_or_else(|| properties::title(&page.properties, &[property]))
}
