//! Referential integrity guard for deletions.
//!
//! The store has no foreign keys, so an author or genre is only removed once
//! no book references it. The check and the removal are two separate store
//! calls: a book inserted in between is not detected.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookInstance, Genre, PopulatedBookInstance},
    repository::{Collection, Document, Filter, Repository},
    services::catalog::CatalogService,
};

/// Target of a delete together with the books that reference it
#[derive(Debug, Clone)]
pub struct Dependents<T> {
    pub target: T,
    pub books: Vec<Book>,
}

impl<T> Dependents<T> {
    pub fn is_blocking(&self) -> bool {
        !self.books.is_empty()
    }
}

/// Terminal state of a deletion request
#[derive(Debug, Clone)]
pub enum DeleteOutcome<T> {
    Deleted,
    /// Nothing stored under the id; nothing was removed
    AlreadyGone,
    /// Books still reference the target; nothing was removed
    Blocked(Dependents<T>),
}

#[derive(Clone)]
pub struct IntegrityGuard {
    repository: Repository,
    catalog: CatalogService,
}

impl IntegrityGuard {
    pub fn new(repository: Repository, catalog: CatalogService) -> Self {
        Self { repository, catalog }
    }

    /// Author and its books for the delete confirmation, `None` if already gone
    pub async fn author_delete_confirmation(&self, id: Uuid) -> AppResult<Option<Dependents<Author>>> {
        self.check(self.repository.authors.as_ref(), id, Filter::eq("author", id))
            .await
    }

    pub async fn delete_author(&self, id: Uuid) -> AppResult<DeleteOutcome<Author>> {
        self.guarded_delete(self.repository.authors.as_ref(), id, Filter::eq("author", id))
            .await
    }

    /// Genre and its books for the delete confirmation, `None` if already gone
    pub async fn genre_delete_confirmation(&self, id: Uuid) -> AppResult<Option<Dependents<Genre>>> {
        self.check(self.repository.genres.as_ref(), id, Filter::eq("genre", id))
            .await
    }

    pub async fn delete_genre(&self, id: Uuid) -> AppResult<DeleteOutcome<Genre>> {
        self.guarded_delete(self.repository.genres.as_ref(), id, Filter::eq("genre", id))
            .await
    }

    /// Copy with its book for the delete confirmation, `None` if already gone
    pub async fn book_instance_delete_confirmation(
        &self,
        id: Uuid,
    ) -> AppResult<Option<PopulatedBookInstance>> {
        match self.repository.book_instances.find_by_id(id).await? {
            Some(instance) => Ok(Some(self.catalog.populate_book_instance(instance).await?)),
            None => Ok(None),
        }
    }

    /// Copies have no dependents and are removed directly
    pub async fn delete_book_instance(&self, id: Uuid) -> AppResult<DeleteOutcome<BookInstance>> {
        match self.repository.book_instances.remove_by_id(id).await {
            Ok(()) => {
                tracing::info!("Catalog delete: book instance id={} removed", id);
                Ok(DeleteOutcome::Deleted)
            }
            Err(AppError::NotFound(_)) => Ok(DeleteOutcome::AlreadyGone),
            Err(e) => Err(e),
        }
    }

    /// CHECK: fetch the target and its dependent books concurrently
    async fn check<T: Document>(
        &self,
        targets: &dyn Collection<T>,
        id: Uuid,
        dependents: Filter,
    ) -> AppResult<Option<Dependents<T>>> {
        let (target, books) = tokio::try_join!(
            targets.find_by_id(id),
            self.repository.books.find_where(&dependents, None),
        )?;
        Ok(target.map(|target| Dependents { target, books }))
    }

    async fn guarded_delete<T: Document>(
        &self,
        targets: &dyn Collection<T>,
        id: Uuid,
        dependents: Filter,
    ) -> AppResult<DeleteOutcome<T>> {
        let checked = match self.check(targets, id, dependents).await? {
            Some(checked) => checked,
            None => {
                tracing::debug!("Catalog delete: {} id={} already gone", T::LABEL, id);
                return Ok(DeleteOutcome::AlreadyGone);
            }
        };

        if checked.is_blocking() {
            tracing::info!(
                "Catalog delete: {} id={} blocked by {} book(s)",
                T::LABEL,
                id,
                checked.books.len()
            );
            return Ok(DeleteOutcome::Blocked(checked));
        }

        match targets.remove_by_id(id).await {
            Ok(()) => {
                tracing::info!("Catalog delete: {} id={} removed", T::LABEL, id);
                Ok(DeleteOutcome::Deleted)
            }
            // Removed by someone else since the check
            Err(AppError::NotFound(_)) => Ok(DeleteOutcome::AlreadyGone),
            Err(e) => Err(e),
        }
    }
}
