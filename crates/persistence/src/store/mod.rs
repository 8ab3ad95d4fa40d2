//! Generic soft-deletable document store.
//!
//! A collection holds JSON documents of one record type. Deleting a record is
//! a status transition, not a physical removal, and the soft-delete predicate
//! is ANDed into every read and write issued through this interface; there is
//! no "including deleted" escape hatch.
//!
//! The soft-delete policy is an injected value object rather than a base
//! class, so record-specific repositories wrap a store instance instead of
//! extending one.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared::pagination::{Page, SortOrder};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

/// A record type that can live in a collection.
///
/// Documents serialize to JSON objects. The store owns the `id`,
/// `created_at`, and `updated_at` fields and reassigns them on create.
pub trait Document:
    Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static
{
    /// Name of the backing collection (Postgres table).
    const COLLECTION: &'static str;

    /// Fields that must be unique among non-deleted documents. Enforced at
    /// the storage layer; this is the authoritative boundary for
    /// check-then-create races.
    const UNIQUE_FIELDS: &'static [&'static str];

    fn id(&self) -> Uuid;
}

/// Soft-delete policy: which field marks deletion, which sentinel value means
/// "deleted", and where the deletion timestamp is stamped.
#[derive(Debug, Clone)]
pub struct SoftDeletePolicy {
    pub status_field: &'static str,
    pub deleted_value: &'static str,
    pub deleted_at_field: &'static str,
}

impl Default for SoftDeletePolicy {
    fn default() -> Self {
        Self {
            status_field: "status",
            deleted_value: "deleted",
            deleted_at_field: "deleted_at",
        }
    }
}

impl SoftDeletePolicy {
    /// Whether a raw document carries the deleted sentinel.
    pub fn is_deleted(&self, doc: &Value) -> bool {
        doc.get(self.status_field).and_then(Value::as_str) == Some(self.deleted_value)
    }
}

/// A single filter condition on a document field.
#[derive(Debug, Clone)]
pub enum Cond {
    /// Field equals the value (compared textually).
    Eq(Value),
    /// Field equals any of the values.
    In(Vec<Value>),
    /// Field contains the needle, case-insensitively.
    Contains(String),
}

/// Equality/set-membership/substring filter over document fields.
///
/// Field names always originate from repository code, never from request
/// input.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Cond)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches documents whose `field` equals `value`.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Cond::Eq(value.into())));
        self
    }

    /// Matches documents whose `field` equals any of `values`.
    pub fn is_in(mut self, field: &str, values: Vec<Value>) -> Self {
        self.clauses.push((field.to_string(), Cond::In(values)));
        self
    }

    /// Matches documents whose `field` contains `needle`, ignoring case.
    pub fn contains(mut self, field: &str, needle: &str) -> Self {
        self.clauses
            .push((field.to_string(), Cond::Contains(needle.to_string())));
        self
    }

    pub fn clauses(&self) -> &[(String, Cond)] {
        &self.clauses
    }

    /// Evaluates the filter against a raw document.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|(field, cond)| {
            let value = doc.get(field);
            match cond {
                Cond::Eq(expected) => {
                    value.map(text_of).as_deref() == Some(text_of(expected).as_str())
                }
                Cond::In(values) => value.map(text_of).is_some_and(|actual| {
                    values.iter().any(|v| text_of(v) == actual)
                }),
                Cond::Contains(needle) => value.map(text_of).is_some_and(|actual| {
                    actual.to_lowercase().contains(&needle.to_lowercase())
                }),
            }
        })
    }
}

/// Sort specification for listings.
#[derive(Debug, Clone)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new("created_at", SortOrder::Desc)
    }
}

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record did not serialize to a JSON object")]
    NotAnObject,

    #[error("Patch must be a JSON object")]
    InvalidPatch,
}

impl From<StoreError> for domain::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => domain::Error::Conflict(msg),
            other => domain::Error::Storage(other.to_string()),
        }
    }
}

/// Contract of a soft-deletable collection.
///
/// Every read excludes soft-deleted documents; `update_one` touches at most
/// one live document; `soft_delete` is idempotent. `add_to_set` is an atomic
/// array append (no read-modify-write window), used for the root
/// descendant-linkage side effect.
#[async_trait]
pub trait Store<T: Document>: Send + Sync {
    /// Persists a new document with a freshly assigned id and timestamps.
    async fn create(&self, record: T) -> Result<T, StoreError>;

    /// Returns the first live document matching `filter`, ordered by id.
    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError>;

    /// Returns every live document matching `filter`.
    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError>;

    /// Point lookup by id, soft-delete predicate included.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        self.find_one(&Filter::new().eq("id", id.to_string())).await
    }

    /// Returns the requested page window plus the window-independent total.
    ///
    /// Page and limit are assumed to be >= 1 (validated at the edge).
    /// Ordering is stable: the requested sort plus an id tiebreak.
    async fn find_paginated(
        &self,
        filter: &Filter,
        page: u32,
        limit: u32,
        sort: &Sort,
    ) -> Result<Page<T>, StoreError>;

    /// Shallow-merges `patch` onto at most one live document matching
    /// `filter` and bumps `updated_at`. Fields absent from the patch are left
    /// untouched. Returns the updated document, or None when nothing matched.
    async fn update_one(&self, filter: &Filter, patch: Value) -> Result<Option<T>, StoreError>;

    /// Marks the document deleted and stamps the deletion timestamp. A no-op
    /// on an already-deleted or unknown id.
    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Soft-deletes every live document matching `filter`; returns the count.
    async fn delete_matching(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Atomically appends `value` to the array field of a live document if
    /// not already present. Returns whether the value was added.
    async fn add_to_set(&self, id: Uuid, field: &str, value: Value) -> Result<bool, StoreError>;
}

/// Delegation so callers can hold a store behind `Arc<dyn Store<T>>` and
/// still hand it to the generic repositories.
#[async_trait]
impl<T: Document, S: Store<T> + ?Sized> Store<T> for std::sync::Arc<S> {
    async fn create(&self, record: T) -> Result<T, StoreError> {
        (**self).create(record).await
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        (**self).find_one(filter).await
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        (**self).find(filter).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_paginated(
        &self,
        filter: &Filter,
        page: u32,
        limit: u32,
        sort: &Sort,
    ) -> Result<Page<T>, StoreError> {
        (**self).find_paginated(filter, page, limit, sort).await
    }

    async fn update_one(&self, filter: &Filter, patch: Value) -> Result<Option<T>, StoreError> {
        (**self).update_one(filter, patch).await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        (**self).soft_delete(id).await
    }

    async fn delete_matching(&self, filter: &Filter) -> Result<u64, StoreError> {
        (**self).delete_matching(filter).await
    }

    async fn add_to_set(&self, id: Uuid, field: &str, value: Value) -> Result<bool, StoreError> {
        (**self).add_to_set(id, field, value).await
    }
}

/// Textual form of a JSON value, used for equality comparisons and Postgres
/// `->>`-style extraction parity.
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serializes a record and stamps a fresh id plus creation timestamps.
pub(crate) fn stamp_new<T: Document>(record: &T) -> Result<(Uuid, Value), StoreError> {
    let mut doc = serde_json::to_value(record)?;
    let obj = doc.as_object_mut().ok_or(StoreError::NotAnObject)?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    obj.insert("id".into(), Value::String(id.to_string()));
    obj.insert("created_at".into(), serde_json::to_value(now)?);
    obj.insert("updated_at".into(), serde_json::to_value(now)?);

    Ok((id, doc))
}

/// Deserializes a raw document back into its record type.
pub(crate) fn decode<T: Document>(doc: Value) -> Result<T, StoreError> {
    serde_json::from_value(doc).map_err(StoreError::from)
}
