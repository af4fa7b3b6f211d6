//! Repository layer: the document-store contract the catalog core runs on.
//!
//! Every entity type lives in its own [`Collection`]. The [`Repository`]
//! handle bundles the four collections and is passed explicitly to every
//! service, so the same core runs against the in-memory store or PostgreSQL.

pub mod memory;
pub mod postgres;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, Book, BookInstance, Genre},
};

/// A record stored in a [`Collection`].
///
/// Documents are exchanged with the store as JSON objects, so field names in
/// [`Filter`], [`Sort`] and [`Projection`] are the serialized field names.
pub trait Document:
    Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static
{
    /// Collection (table) name
    const COLLECTION: &'static str;
    /// Human readable entity name used in error messages
    const LABEL: &'static str;

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
}

/// Field predicate with document-store semantics
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Field equals the value; for array fields, any element equals it.
    /// A null value also matches documents without the field.
    Eq(&'static str, Value),
    /// Field equals one of the values
    In(&'static str, Vec<Value>),
}

impl Filter {
    pub fn eq<V: Serialize>(field: &'static str, value: V) -> Self {
        Filter::Eq(field, serde_json::json!(value))
    }

    pub fn any_of<V: Serialize>(field: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(
            field,
            values.into_iter().map(|v| serde_json::json!(v)).collect(),
        )
    }

    /// Evaluate the predicate against a serialized document
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, expected) => match doc.get(*field) {
                Some(Value::Array(elements)) if !expected.is_array() => {
                    elements.iter().any(|e| e == expected)
                }
                Some(actual) => actual == expected,
                None => expected.is_null(),
            },
            Filter::In(field, candidates) => {
                let actual = doc.get(*field).unwrap_or(&Value::Null);
                candidates.iter().any(|c| c == actual)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Single-field sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: &'static str) -> Self {
        Self { field, direction: SortDirection::Asc }
    }

    pub fn desc(field: &'static str) -> Self {
        Self { field, direction: SortDirection::Desc }
    }

    /// Compare two serialized documents on the sort field
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = compare_values(
            a.get(self.field).unwrap_or(&Value::Null),
            b.get(self.field).unwrap_or(&Value::Null),
        );
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => a.to_string().cmp(&b.to_string()),
    }
}

/// Names the fields a read should return; `id` is always kept
pub type Projection = &'static [&'static str];

/// Keep `id` and the projected fields of a serialized document
pub fn project(doc: Value, projection: Projection) -> Value {
    match doc {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(key, _)| key == "id" || projection.contains(&key.as_str()))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Typed CRUD and query access to one collection of documents.
///
/// All operations are fallible with a store error (`AppError::Database` /
/// `AppError::Store`) that is distinct from "not found".
#[async_trait]
pub trait Collection<T: Document>: Send + Sync {
    async fn find_all(&self, sort: Option<Sort>) -> AppResult<Vec<T>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<T>>;

    /// Documents matching `filter`, in insertion order
    async fn find_where(&self, filter: &Filter, projection: Option<Projection>) -> AppResult<Vec<T>>;

    /// First document matching `filter`, in insertion order
    async fn find_one(&self, filter: &Filter) -> AppResult<Option<T>>;

    async fn count(&self, filter: &Filter) -> AppResult<u64>;

    /// Store a new document under a freshly assigned id
    async fn insert(&self, record: T) -> AppResult<T>;

    /// Replace the document stored under `id`. `AppError::NotFound` if absent.
    async fn replace_by_id(&self, id: Uuid, record: T) -> AppResult<T>;

    /// `AppError::NotFound` if absent
    async fn remove_by_id(&self, id: Uuid) -> AppResult<()>;
}

/// Store handle holding one collection per entity type
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn Collection<Author>>,
    pub genres: Arc<dyn Collection<Genre>>,
    pub books: Arc<dyn Collection<Book>>,
    pub book_instances: Arc<dyn Collection<BookInstance>>,
}

impl Repository {
    /// Repository over empty in-process collections
    pub fn in_memory() -> Self {
        Self {
            authors: Arc::new(memory::InMemoryCollection::<Author>::new()),
            genres: Arc::new(memory::InMemoryCollection::<Genre>::new()),
            books: Arc::new(memory::InMemoryCollection::<Book>::new()),
            book_instances: Arc::new(memory::InMemoryCollection::<BookInstance>::new()),
        }
    }

    /// Repository over JSONB document tables in PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(postgres::PgCollection::<Author>::new(pool.clone())),
            genres: Arc::new(postgres::PgCollection::<Genre>::new(pool.clone())),
            books: Arc::new(postgres::PgCollection::<Book>::new(pool.clone())),
            book_instances: Arc::new(postgres::PgCollection::<BookInstance>::new(pool)),
        }
    }
}
