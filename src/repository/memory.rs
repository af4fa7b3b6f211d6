//! In-process document collections

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{project, Collection, Document, Filter, Projection, Sort};
use crate::error::{AppError, AppResult};

/// Collection kept in memory, in insertion order.
///
/// Documents are stored serialized, the way a document database keeps them,
/// so filters and projections see exactly the stored fields.
pub struct InMemoryCollection<T> {
    docs: Arc<RwLock<IndexMap<Uuid, Value>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> InMemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            docs: Arc::new(RwLock::new(IndexMap::new())),
            _marker: PhantomData,
        }
    }

    fn decode(doc: Value) -> AppResult<T> {
        Ok(serde_json::from_value(doc)?)
    }
}

impl<T: Document> Default for InMemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for InMemoryCollection<T> {
    fn clone(&self) -> Self {
        Self {
            docs: self.docs.clone(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Document> Collection<T> for InMemoryCollection<T> {
    async fn find_all(&self, sort: Option<Sort>) -> AppResult<Vec<T>> {
        let mut docs: Vec<Value> = self.docs.read().await.values().cloned().collect();
        if let Some(sort) = sort {
            docs.sort_by(|a, b| sort.compare(a, b));
        }
        docs.into_iter().map(Self::decode).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<T>> {
        let doc = self.docs.read().await.get(&id).cloned();
        doc.map(Self::decode).transpose()
    }

    async fn find_where(&self, filter: &Filter, projection: Option<Projection>) -> AppResult<Vec<T>> {
        let matching: Vec<Value> = self
            .docs
            .read()
            .await
            .values()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();

        matching
            .into_iter()
            .map(|doc| match projection {
                Some(fields) => Self::decode(project(doc, fields)),
                None => Self::decode(doc),
            })
            .collect()
    }

    async fn find_one(&self, filter: &Filter) -> AppResult<Option<T>> {
        let doc = self
            .docs
            .read()
            .await
            .values()
            .find(|doc| filter.matches(doc))
            .cloned();
        doc.map(Self::decode).transpose()
    }

    async fn count(&self, filter: &Filter) -> AppResult<u64> {
        let count = self
            .docs
            .read()
            .await
            .values()
            .filter(|doc| filter.matches(doc))
            .count();
        Ok(count as u64)
    }

    async fn insert(&self, mut record: T) -> AppResult<T> {
        let id = Uuid::new_v4();
        record.set_id(id);
        let doc = serde_json::to_value(&record)?;
        self.docs.write().await.insert(id, doc);
        Ok(record)
    }

    async fn replace_by_id(&self, id: Uuid, mut record: T) -> AppResult<T> {
        record.set_id(id);
        let doc = serde_json::to_value(&record)?;
        let mut docs = self.docs.write().await;
        match docs.get_mut(&id) {
            Some(slot) => {
                *slot = doc;
                Ok(record)
            }
            None => Err(AppError::NotFound(format!("{} {} not found", T::LABEL, id))),
        }
    }

    async fn remove_by_id(&self, id: Uuid) -> AppResult<()> {
        if self.docs.write().await.shift_remove(&id).is_none() {
            return Err(AppError::NotFound(format!("{} {} not found", T::LABEL, id)));
        }
        Ok(())
    }
}
