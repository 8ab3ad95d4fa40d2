//! Postgres store backend.
//!
//! Each collection is a `(id UUID PRIMARY KEY, doc JSONB)` table. Uniqueness
//! among live documents is enforced by partial unique indexes (see
//! `src/migrations`), which makes the database the authoritative boundary
//! for check-then-create races. `add_to_set` is a single UPDATE statement,
//! so concurrent root-linkage writes cannot lose elements.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use shared::pagination::{skip, Page, SortOrder};
use sqlx::PgPool;
use uuid::Uuid;

use super::{decode, stamp_new, text_of, Document, Cond, Filter, SoftDeletePolicy, Sort, Store, StoreError};

/// Postgres-backed collection of JSONB documents.
#[derive(Debug)]
pub struct PgStore<T: Document> {
    pool: PgPool,
    policy: SoftDeletePolicy,
    _record: PhantomData<fn() -> T>,
}

impl<T: Document> Clone for PgStore<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            policy: self.policy.clone(),
            _record: PhantomData,
        }
    }
}

/// Bind values produced alongside a generated WHERE clause.
enum Bind {
    Text(String),
    TextList(Vec<String>),
}

impl<T: Document> PgStore<T> {
    pub fn new(pool: PgPool, policy: SoftDeletePolicy) -> Self {
        Self {
            pool,
            policy,
            _record: PhantomData,
        }
    }

    /// Renders the filter plus the soft-delete predicate as SQL.
    ///
    /// Field and policy names are compile-time constants from repository
    /// code; only values are bound as parameters (numbered from `start`).
    fn where_clause(&self, filter: &Filter, start: usize) -> (String, Vec<Bind>) {
        let mut conds = vec![format!(
            "coalesce(doc->>'{}', '') <> '{}'",
            self.policy.status_field, self.policy.deleted_value
        )];
        let mut binds = Vec::new();
        let mut index = start;

        for (field, cond) in filter.clauses() {
            match cond {
                Cond::Eq(value) => {
                    conds.push(format!("doc->>'{field}' = ${index}"));
                    binds.push(Bind::Text(text_of(value)));
                }
                Cond::In(values) => {
                    conds.push(format!("doc->>'{field}' = ANY(${index})"));
                    binds.push(Bind::TextList(values.iter().map(text_of).collect()));
                }
                Cond::Contains(needle) => {
                    conds.push(format!("doc->>'{field}' ILIKE ${index}"));
                    binds.push(Bind::Text(format!("%{}%", escape_like(needle))));
                }
            }
            index += 1;
        }

        (conds.join(" AND "), binds)
    }

    fn order_expr(field: &str) -> String {
        match field {
            // Timestamp fields sort chronologically, not lexically
            "created_at" | "updated_at" | "deleted_at" => {
                format!("(doc->>'{field}')::timestamptz")
            }
            _ => format!("doc->>'{field}'"),
        }
    }
}

/// Escapes LIKE metacharacters in a user-supplied needle.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Maps Postgres unique-violation errors onto the store's conflict error.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unique index").to_string();
            return StoreError::Conflict(format!("unique constraint \"{constraint}\""));
        }
    }
    StoreError::Database(err)
}

fn bind_scalar<'q>(
    query: sqlx::query::QueryScalar<'q, sqlx::Postgres, Value, sqlx::postgres::PgArguments>,
    binds: Vec<Bind>,
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, Value, sqlx::postgres::PgArguments> {
    let mut query = query;
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::TextList(list) => query.bind(list),
        };
    }
    query
}

#[async_trait]
impl<T: Document> Store<T> for PgStore<T> {
    async fn create(&self, record: T) -> Result<T, StoreError> {
        let (id, doc) = stamp_new(&record)?;
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) RETURNING doc",
            T::COLLECTION
        );

        let stored: Value = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(&doc)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        decode(stored)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let (where_sql, binds) = self.where_clause(filter, 1);
        let sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY id LIMIT 1",
            T::COLLECTION,
            where_sql
        );

        let row = bind_scalar(sqlx::query_scalar(&sql), binds)
            .fetch_optional(&self.pool)
            .await?;

        row.map(decode).transpose()
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        let (where_sql, binds) = self.where_clause(filter, 1);
        let sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY id",
            T::COLLECTION,
            where_sql
        );

        let rows = bind_scalar(sqlx::query_scalar(&sql), binds)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(decode).collect()
    }

    async fn find_paginated(
        &self,
        filter: &Filter,
        page: u32,
        limit: u32,
        sort: &Sort,
    ) -> Result<Page<T>, StoreError> {
        let (where_sql, binds) = self.where_clause(filter, 1);

        let count_sql = format!("SELECT COUNT(*) FROM {} WHERE {}", T::COLLECTION, where_sql);
        let total: i64 = {
            let mut query = sqlx::query_scalar(&count_sql);
            for bind in &binds {
                query = match bind {
                    Bind::Text(text) => query.bind(text.clone()),
                    Bind::TextList(list) => query.bind(list.clone()),
                };
            }
            query.fetch_one(&self.pool).await?
        };

        let direction = match sort.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let offset_param = binds.len() + 1;
        let limit_param = binds.len() + 2;
        let page_sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY {} {}, id ASC OFFSET ${} LIMIT ${}",
            T::COLLECTION,
            where_sql,
            Self::order_expr(&sort.field),
            direction,
            offset_param,
            limit_param
        );

        let rows = bind_scalar(sqlx::query_scalar(&page_sql), binds)
            .bind(skip(page, limit) as i64)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let items = rows.into_iter().map(decode).collect::<Result<Vec<T>, _>>()?;
        Ok(Page::new(items, total as u64, page, limit))
    }

    async fn update_one(&self, filter: &Filter, patch: Value) -> Result<Option<T>, StoreError> {
        if !patch.is_object() {
            return Err(StoreError::InvalidPatch);
        }

        let (where_sql, binds) = self.where_clause(filter, 2);
        let sql = format!(
            "UPDATE {t} SET doc = doc || $1 || jsonb_build_object('updated_at', to_jsonb(now())) \
             WHERE id IN (SELECT id FROM {t} WHERE {where_sql} ORDER BY id LIMIT 1) \
             RETURNING doc",
            t = T::COLLECTION,
        );

        let row = bind_scalar(sqlx::query_scalar(&sql).bind(&patch), binds)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {t} SET doc = doc || jsonb_build_object(\
                '{status}', '{deleted}'::text, \
                '{deleted_at}', to_jsonb(now()), \
                'updated_at', to_jsonb(now())) \
             WHERE id = $1 AND coalesce(doc->>'{status}', '') <> '{deleted}'",
            t = T::COLLECTION,
            status = self.policy.status_field,
            deleted = self.policy.deleted_value,
            deleted_at = self.policy.deleted_at_field,
        );

        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_matching(&self, filter: &Filter) -> Result<u64, StoreError> {
        let (where_sql, binds) = self.where_clause(filter, 1);
        let sql = format!(
            "UPDATE {t} SET doc = doc || jsonb_build_object(\
                '{status}', '{deleted}'::text, \
                '{deleted_at}', to_jsonb(now()), \
                'updated_at', to_jsonb(now())) \
             WHERE {where_sql}",
            t = T::COLLECTION,
            status = self.policy.status_field,
            deleted = self.policy.deleted_value,
            deleted_at = self.policy.deleted_at_field,
        );

        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = match bind {
                Bind::Text(text) => query.bind(text),
                Bind::TextList(list) => query.bind(list),
            };
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn add_to_set(&self, id: Uuid, field: &str, value: Value) -> Result<bool, StoreError> {
        // Single statement: append iff absent, no read-modify-write window
        let sql = format!(
            "UPDATE {t} SET doc = jsonb_set(\
                doc, '{{{field}}}', coalesce(doc->'{field}', '[]'::jsonb) || $2, true) \
                || jsonb_build_object('updated_at', to_jsonb(now())) \
             WHERE id = $1 \
               AND coalesce(doc->>'{status}', '') <> '{deleted}' \
               AND NOT coalesce(doc->'{field}', '[]'::jsonb) @> $2",
            t = T::COLLECTION,
            status = self.policy.status_field,
            deleted = self.policy.deleted_value,
        );

        let element = Value::Array(vec![value]);
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&element)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
