//! Embedded in-memory store backend.
//!
//! Backs unit tests and local development with the same contract as the
//! Postgres backend, including storage-layer uniqueness enforcement among
//! live documents.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use shared::pagination::{skip, Page, SortOrder};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{decode, stamp_new, text_of, Document, Filter, SoftDeletePolicy, Sort, Store, StoreError};

/// In-memory collection of raw JSON documents keyed by id.
#[derive(Debug)]
pub struct MemStore<T: Document> {
    docs: Arc<RwLock<HashMap<Uuid, Value>>>,
    policy: SoftDeletePolicy,
    _record: PhantomData<fn() -> T>,
}

impl<T: Document> Clone for MemStore<T> {
    fn clone(&self) -> Self {
        Self {
            docs: Arc::clone(&self.docs),
            policy: self.policy.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Document> MemStore<T> {
    pub fn new(policy: SoftDeletePolicy) -> Self {
        Self {
            docs: Arc::new(RwLock::new(HashMap::new())),
            policy,
            _record: PhantomData,
        }
    }

    /// Raw document lookup that ignores the soft-delete predicate. Test-only:
    /// the public contract never exposes deleted documents.
    #[cfg(test)]
    pub(crate) async fn raw(&self, id: Uuid) -> Option<Value> {
        self.docs.read().await.get(&id).cloned()
    }

    fn live_matching(&self, docs: &HashMap<Uuid, Value>, filter: &Filter) -> Vec<(Uuid, Value)> {
        let mut matching: Vec<(Uuid, Value)> = docs
            .iter()
            .filter(|(_, doc)| !self.policy.is_deleted(doc) && filter.matches(doc))
            .map(|(id, doc)| (*id, doc.clone()))
            .collect();
        matching.sort_by_key(|(id, _)| *id);
        matching
    }

    fn check_unique(
        &self,
        docs: &HashMap<Uuid, Value>,
        candidate: &Value,
        exclude: Option<Uuid>,
    ) -> Result<(), StoreError> {
        for field in T::UNIQUE_FIELDS {
            let Some(value) = candidate.get(*field) else {
                continue;
            };
            let needle = text_of(value);
            let clash = docs.iter().any(|(id, doc)| {
                Some(*id) != exclude
                    && !self.policy.is_deleted(doc)
                    && doc.get(*field).map(|v| text_of(v)).as_deref() == Some(needle.as_str())
            });
            if clash {
                return Err(StoreError::Conflict(format!(
                    "duplicate value for unique field \"{field}\""
                )));
            }
        }
        Ok(())
    }

    fn mark_deleted(&self, doc: &mut Value) {
        if let Some(obj) = doc.as_object_mut() {
            let now = serde_json::json!(Utc::now());
            obj.insert(
                self.policy.status_field.into(),
                Value::String(self.policy.deleted_value.into()),
            );
            obj.insert(self.policy.deleted_at_field.into(), now.clone());
            obj.insert("updated_at".into(), now);
        }
    }
}

/// Compares two documents on a field, falling back to textual comparison for
/// non-numeric values (matching Postgres `->>` extraction).
fn cmp_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(m), Some(n)) => m.partial_cmp(&n).unwrap_or(Ordering::Equal),
            _ => text_of(x).cmp(&text_of(y)),
        },
    }
}

#[async_trait]
impl<T: Document> Store<T> for MemStore<T> {
    async fn create(&self, record: T) -> Result<T, StoreError> {
        let (id, doc) = stamp_new(&record)?;
        let mut docs = self.docs.write().await;
        self.check_unique(&docs, &doc, None)?;
        docs.insert(id, doc.clone());
        decode(doc)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let docs = self.docs.read().await;
        self.live_matching(&docs, filter)
            .into_iter()
            .next()
            .map(|(_, doc)| decode(doc))
            .transpose()
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        let docs = self.docs.read().await;
        self.live_matching(&docs, filter)
            .into_iter()
            .map(|(_, doc)| decode(doc))
            .collect()
    }

    async fn find_paginated(
        &self,
        filter: &Filter,
        page: u32,
        limit: u32,
        sort: &Sort,
    ) -> Result<Page<T>, StoreError> {
        let docs = self.docs.read().await;
        let mut matching = self.live_matching(&docs, filter);

        matching.sort_by(|(a_id, a), (b_id, b)| {
            let by_field = match sort.order {
                SortOrder::Asc => cmp_field(a, b, &sort.field),
                SortOrder::Desc => cmp_field(a, b, &sort.field).reverse(),
            };
            // Id tiebreak keeps pagination deterministic
            by_field.then(a_id.cmp(b_id))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(skip(page, limit) as usize)
            .take(limit as usize)
            .map(|(_, doc)| decode(doc))
            .collect::<Result<Vec<T>, _>>()?;

        Ok(Page::new(items, total, page, limit))
    }

    async fn update_one(&self, filter: &Filter, patch: Value) -> Result<Option<T>, StoreError> {
        let Some(fields) = patch.as_object() else {
            return Err(StoreError::InvalidPatch);
        };

        let mut docs = self.docs.write().await;
        let Some((id, mut doc)) = self.live_matching(&docs, filter).into_iter().next() else {
            return Ok(None);
        };

        if let Some(obj) = doc.as_object_mut() {
            for (key, value) in fields {
                obj.insert(key.clone(), value.clone());
            }
            obj.insert("updated_at".into(), serde_json::json!(Utc::now()));
        }

        self.check_unique(&docs, &doc, Some(id))?;
        docs.insert(id, doc.clone());
        decode(doc).map(Some)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        if let Some(doc) = docs.get_mut(&id) {
            if !self.policy.is_deleted(doc) {
                let mut updated = doc.clone();
                self.mark_deleted(&mut updated);
                *doc = updated;
            }
        }
        Ok(())
    }

    async fn delete_matching(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut docs = self.docs.write().await;
        let ids: Vec<Uuid> = self
            .live_matching(&docs, filter)
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        for id in &ids {
            if let Some(doc) = docs.get_mut(id) {
                let mut updated = doc.clone();
                self.mark_deleted(&mut updated);
                *doc = updated;
            }
        }
        Ok(ids.len() as u64)
    }

    async fn add_to_set(&self, id: Uuid, field: &str, value: Value) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().await;
        let Some(doc) = docs.get_mut(&id) else {
            return Ok(false);
        };
        if self.policy.is_deleted(doc) {
            return Ok(false);
        }

        let Some(obj) = doc.as_object_mut() else {
            return Err(StoreError::NotAnObject);
        };
        let entry = obj
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let Some(array) = entry.as_array_mut() else {
            return Err(StoreError::NotAnObject);
        };

        if array.contains(&value) {
            return Ok(false);
        }
        array.push(value);
        obj.insert("updated_at".into(), serde_json::json!(Utc::now()));
        Ok(true)
    }
}
