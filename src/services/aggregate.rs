//! Concurrent fan-out of independent reads.
//!
//! Fixed-shape aggregates of different types (detail pages, delete
//! confirmations, update prefill) use `tokio::try_join!` directly. The helpers
//! here cover named sets of operations that produce the same type, such as
//! the homepage counts or the pick-lists of the book form.
//!
//! Operations run concurrently on the calling task; nothing is spawned.
//! Completion order is unspecified, only the name of each slot is.

use std::future::Future;
use std::hash::Hash;

use futures::future::{join_all, try_join_all};
use indexmap::IndexMap;

use crate::error::{AppError, AppResult};

/// Run every operation and join the outputs under their names.
///
/// The first failure aborts the whole aggregate: outstanding operations are
/// dropped and no partial result is returned.
pub async fn fetch_all<K, T, F>(ops: impl IntoIterator<Item = (K, F)>) -> AppResult<IndexMap<K, T>>
where
    K: Hash + Eq,
    F: Future<Output = AppResult<T>>,
{
    let (names, pending): (Vec<K>, Vec<F>) = ops.into_iter().unzip();
    let outputs = try_join_all(pending).await?;
    Ok(names.into_iter().zip(outputs).collect())
}

/// Outcome of [`fetch_settled`]
#[derive(Debug)]
pub struct Settled<K: Hash + Eq, T> {
    /// Outputs of the operations that succeeded
    pub values: IndexMap<K, T>,
    /// First failure, in slot order
    pub error: Option<AppError>,
}

/// Run every operation to completion and report each slot, keeping the first
/// failure instead of aborting.
pub async fn fetch_settled<K, T, F>(ops: impl IntoIterator<Item = (K, F)>) -> Settled<K, T>
where
    K: Hash + Eq + std::fmt::Debug,
    F: Future<Output = AppResult<T>>,
{
    let (names, pending): (Vec<K>, Vec<F>) = ops.into_iter().unzip();
    let results = join_all(pending).await;

    let mut values = IndexMap::new();
    let mut error = None;
    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(value) => {
                values.insert(name, value);
            }
            Err(e) => {
                tracing::debug!("Fan-out slot {:?} failed: {}", name, e);
                if error.is_none() {
                    error = Some(e);
                }
            }
        }
    }

    Settled { values, error }
}
