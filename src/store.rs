use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreResult;
use crate::properties::PropertyMap;

pub mod http;
pub mod memory;

static NULL_PAYLOAD: Value = Value::Null;

/// One page of a paginated listing
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Paged<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> Paged<T> {
    /// A listing that fits in a single page
    #[must_use]
    pub fn complete(results: Vec<T>) -> Self {
        Self {
            results,
            has_more: false,
            next_cursor: None,
        }
    }
}

/// A raw content block as the store returns it
///
/// The block's typed payload sits under a key named after `kind`; the
/// flattened map keeps it without enumerating every kind the store knows.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BlockRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl BlockRecord {
    /// Create a childless record with its payload under the type key
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>, payload: Value) -> Self {
        let kind = kind.into();
        let mut map = Map::new();
        map.insert(kind.clone(), payload);
        Self {
            id: id.into(),
            kind,
            has_children: false,
            payload: map,
        }
    }

    /// The object stored under the record's type key
    #[must_use]
    pub fn type_payload(&self) -> &Value {
        self.payload.get(&self.kind).unwrap_or(&NULL_PAYLOAD)
    }
}

/// A database page as the store returns it
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PageRecord {
    pub id: String,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub last_edited_time: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Sort order of a database query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// Filter and sort criteria of a database query
///
/// Serializes straight into the body the store's query endpoint expects.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DatabaseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Value>,
}

impl DatabaseQuery {
    /// Create an unfiltered query
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a query with the given filter clause
    #[must_use]
    pub fn filtered(filter: Value) -> Self {
        Self {
            filter: Some(filter),
            sorts: Vec::new(),
        }
    }

    /// Sort by a property, date properties compare on their start
    #[must_use]
    pub fn sort_by_property(mut self, property: &str, direction: SortDirection) -> Self {
        self.sorts.push(serde_json::json!({
            "property": property,
            "direction": direction.as_str(),
        }));
        self
    }

    /// Sort by the page creation timestamp
    #[must_use]
    pub fn sort_by_created_time(mut self, direction: SortDirection) -> Self {
        self.sorts.push(serde_json::json!({
            "timestamp": "created_time",
            "direction": direction.as_str(),
        }));
        self
    }
}

/// Filter clauses understood by the store's query endpoint
pub mod filter {
    use serde_json::{Value, json};

    /// All clauses must match
    #[must_use]
    pub fn and(clauses: Vec<Value>) -> Value {
        json!({ "and": clauses })
    }

    /// At least one clause must match
    #[must_use]
    pub fn or(clauses: Vec<Value>) -> Value {
        json!({ "or": clauses })
    }

    /// A relation property references the given page
    #[must_use]
    pub fn relation_contains(property: &str, id: &str) -> Value {
        json!({ "property": property, "relation": { "contains": id } })
    }

    /// A checkbox property has the given value
    #[must_use]
    pub fn checkbox_equals(property: &str, value: bool) -> Value {
        json!({ "property": property, "checkbox": { "equals": value } })
    }

    /// An email property equals the given address
    #[must_use]
    pub fn email_equals(property: &str, value: &str) -> Value {
        json!({ "property": property, "email": { "equals": value } })
    }

    /// A rich text property equals the given text
    #[must_use]
    pub fn text_equals(property: &str, value: &str) -> Value {
        json!({ "property": property, "rich_text": { "equals": value } })
    }

    /// A status property is at the given option
    #[must_use]
    pub fn status_equals(property: &str, value: &str) -> Value {
        json!({ "property": property, "status": { "equals": value } })
    }
}

/// Client of the hosted workspace store
///
/// The portal only ever needs these five endpoints; [`http::HttpStore`]
/// speaks to the real service and [`memory::MemoryStore`] backs tests.
#[async_trait]
pub trait WorkspaceStore: Send + Sync + Debug {
    /// List one page of a block's direct children
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or rejects the request
    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> StoreResult<Paged<BlockRecord>>;

    /// Retrieve a single page by id
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist or the store fails
    async fn retrieve_page(&self, page_id: &str) -> StoreResult<PageRecord>;

    /// Query a database for pages matching the criteria
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or rejects the query
    async fn query_database(
        &self,
        database_id: &str,
        query: DatabaseQuery,
    ) -> StoreResult<Paged<PageRecord>>;

    /// Create a page in a database
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the properties
    async fn create_page(
        &self,
        database_id: &str,
        properties: PropertyMap,
    ) -> StoreResult<PageRecord>;

    /// Update properties of an existing page
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist or the store fails
    async fn update_page(&self, page_id: &str, properties: PropertyMap)
    -> StoreResult<PageRecord>;
}
