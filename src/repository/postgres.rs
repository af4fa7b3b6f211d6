//! PostgreSQL document collections.
//!
//! Each collection is a table of `(id UUID, seq BIGSERIAL, doc JSONB)`, see
//! `migrations/`. Field names used in filters, sorts and projections come from
//! code, never from requests, and are spliced into the SQL as JSON keys.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, Pool, Postgres};
use uuid::Uuid;

use super::{Collection, Document, Filter, Projection, Sort, SortDirection};
use crate::error::{AppError, AppResult};

pub struct PgCollection<T> {
    pool: Pool<Postgres>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> PgCollection<T> {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for PgCollection<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _marker: PhantomData,
        }
    }
}

/// JSON key literal for a code-defined field name
fn key(field: &str) -> String {
    debug_assert!(field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    format!("'{}'", field)
}

/// Build the WHERE clause for a filter. Placeholders start at `$1`.
fn where_clause(filter: &Filter) -> (String, Vec<Value>) {
    match filter {
        Filter::All => ("TRUE".to_string(), vec![]),
        // A missing key reads as null, like the in-memory store
        Filter::Eq(field, Value::Null) => (
            format!(
                "(doc -> {k} IS NULL OR doc -> {k} = 'null'::jsonb OR (jsonb_typeof(doc -> {k}) = 'array' AND doc -> {k} @> '[null]'::jsonb))",
                k = key(field)
            ),
            vec![],
        ),
        Filter::Eq(field, value) => {
            let k = key(field);
            (
                format!(
                    "(doc -> {k} = $1 OR (jsonb_typeof(doc -> {k}) = 'array' AND doc -> {k} @> jsonb_build_array($1)))",
                    k = k
                ),
                vec![value.clone()],
            )
        }
        Filter::In(field, values) => (
            format!("$1 @> jsonb_build_array(doc -> {})", key(field)),
            vec![Value::Array(values.clone())],
        ),
    }
}

fn order_clause(sort: Option<Sort>) -> String {
    match sort {
        Some(sort) => {
            let direction = match sort.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            format!("ORDER BY doc -> {} {}, seq", key(sort.field), direction)
        }
        None => "ORDER BY seq".to_string(),
    }
}

#[async_trait]
impl<T: Document> Collection<T> for PgCollection<T> {
    async fn find_all(&self, sort: Option<Sort>) -> AppResult<Vec<T>> {
        let query = format!("SELECT doc FROM {} {}", T::COLLECTION, order_clause(sort));
        let rows = sqlx::query_scalar::<_, Json<T>>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<T>> {
        let query = format!("SELECT doc FROM {} WHERE id = $1", T::COLLECTION);
        let row = sqlx::query_scalar::<_, Json<T>>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(doc)| doc))
    }

    async fn find_where(&self, filter: &Filter, projection: Option<Projection>) -> AppResult<Vec<T>> {
        let (condition, params) = where_clause(filter);
        let selected = match projection {
            Some(_) => format!(
                "(SELECT jsonb_object_agg(e.key, e.value) FROM jsonb_each(doc) e \
                 WHERE e.key = 'id' OR e.key = ANY(${}))",
                params.len() + 1
            ),
            None => "doc".to_string(),
        };
        let query = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY seq",
            selected,
            T::COLLECTION,
            condition
        );

        let mut builder = sqlx::query_scalar::<_, Json<T>>(&query);
        for param in params {
            builder = builder.bind(Json(param));
        }
        if let Some(fields) = projection {
            let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
            builder = builder.bind(fields);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn find_one(&self, filter: &Filter) -> AppResult<Option<T>> {
        let (condition, params) = where_clause(filter);
        let query = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY seq LIMIT 1",
            T::COLLECTION,
            condition
        );

        let mut builder = sqlx::query_scalar::<_, Json<T>>(&query);
        for param in params {
            builder = builder.bind(Json(param));
        }

        let row = builder.fetch_optional(&self.pool).await?;
        Ok(row.map(|Json(doc)| doc))
    }

    async fn count(&self, filter: &Filter) -> AppResult<u64> {
        let (condition, params) = where_clause(filter);
        let query = format!("SELECT COUNT(*) FROM {} WHERE {}", T::COLLECTION, condition);

        let mut builder = sqlx::query_scalar::<_, i64>(&query);
        for param in params {
            builder = builder.bind(Json(param));
        }

        let count = builder.fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn insert(&self, mut record: T) -> AppResult<T> {
        let id = Uuid::new_v4();
        record.set_id(id);

        let query = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) RETURNING doc",
            T::COLLECTION
        );
        let Json(stored) = sqlx::query_scalar::<_, Json<T>>(&query)
            .bind(id)
            .bind(Json(&record))
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn replace_by_id(&self, id: Uuid, mut record: T) -> AppResult<T> {
        record.set_id(id);

        let query = format!(
            "UPDATE {} SET doc = $2 WHERE id = $1 RETURNING doc",
            T::COLLECTION
        );
        sqlx::query_scalar::<_, Json<T>>(&query)
            .bind(id)
            .bind(Json(&record))
            .fetch_optional(&self.pool)
            .await?
            .map(|Json(doc)| doc)
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", T::LABEL, id)))
    }

    async fn remove_by_id(&self, id: Uuid) -> AppResult<()> {
        let query = format!("DELETE FROM {} WHERE id = $1", T::COLLECTION);
        let result = sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {} not found", T::LABEL, id)));
        }
        Ok(())
    }
}
