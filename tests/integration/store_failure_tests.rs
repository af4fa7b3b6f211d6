//! Store failure paths, driven by mocked collections

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use uuid::Uuid;

use catalog_server::{
    error::{AppError, AppResult},
    models::{Author, AuthorForm, BookInstance, Genre},
    repository::{Collection, Filter, Projection, Repository, Sort},
    services::Services,
};

mock! {
    pub Authors {}

    #[async_trait]
    impl Collection<Author> for Authors {
        async fn find_all(&self, sort: Option<Sort>) -> AppResult<Vec<Author>>;
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>>;
        async fn find_where(&self, filter: &Filter, projection: Option<Projection>) -> AppResult<Vec<Author>>;
        async fn find_one(&self, filter: &Filter) -> AppResult<Option<Author>>;
        async fn count(&self, filter: &Filter) -> AppResult<u64>;
        async fn insert(&self, record: Author) -> AppResult<Author>;
        async fn replace_by_id(&self, id: Uuid, record: Author) -> AppResult<Author>;
        async fn remove_by_id(&self, id: Uuid) -> AppResult<()>;
    }
}

mock! {
    pub Genres {}

    #[async_trait]
    impl Collection<Genre> for Genres {
        async fn find_all(&self, sort: Option<Sort>) -> AppResult<Vec<Genre>>;
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Genre>>;
        async fn find_where(&self, filter: &Filter, projection: Option<Projection>) -> AppResult<Vec<Genre>>;
        async fn find_one(&self, filter: &Filter) -> AppResult<Option<Genre>>;
        async fn count(&self, filter: &Filter) -> AppResult<u64>;
        async fn insert(&self, record: Genre) -> AppResult<Genre>;
        async fn replace_by_id(&self, id: Uuid, record: Genre) -> AppResult<Genre>;
        async fn remove_by_id(&self, id: Uuid) -> AppResult<()>;
    }
}

mock! {
    pub BookInstances {}

    #[async_trait]
    impl Collection<BookInstance> for BookInstances {
        async fn find_all(&self, sort: Option<Sort>) -> AppResult<Vec<BookInstance>>;
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BookInstance>>;
        async fn find_where(&self, filter: &Filter, projection: Option<Projection>) -> AppResult<Vec<BookInstance>>;
        async fn find_one(&self, filter: &Filter) -> AppResult<Option<BookInstance>>;
        async fn count(&self, filter: &Filter) -> AppResult<u64>;
        async fn insert(&self, record: BookInstance) -> AppResult<BookInstance>;
        async fn replace_by_id(&self, id: Uuid, record: BookInstance) -> AppResult<BookInstance>;
        async fn remove_by_id(&self, id: Uuid) -> AppResult<()>;
    }
}

fn store_down() -> AppError {
    AppError::Store("connection reset by peer".to_string())
}

fn with_authors(authors: MockAuthors) -> Services {
    let repository = Repository {
        authors: Arc::new(authors),
        ..Repository::in_memory()
    };
    Services::new(repository)
}

#[tokio::test]
async fn test_summary_survives_a_failing_count() {
    let mut instances = MockBookInstances::new();
    instances.expect_count().returning(|filter| match filter {
        Filter::All => Ok(7),
        _ => Err(store_down()),
    });
    let repository = Repository {
        book_instances: Arc::new(instances),
        ..Repository::in_memory()
    };
    let services = Services::new(repository);

    let summary = services.stats.summary().await;

    assert_eq!(summary.data.book_instance_count, Some(7));
    assert_eq!(summary.data.book_instance_available_count, None);
    assert_eq!(summary.data.book_count, Some(0));
    assert!(summary.error.unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_rejected_submission_never_touches_the_store() {
    let mut authors = MockAuthors::new();
    authors.expect_insert().never();
    authors.expect_replace_by_id().never();
    let services = with_authors(authors);

    let form = AuthorForm {
        first_name: Some("Jane".to_string()),
        family_name: None,
        ..Default::default()
    };
    let outcome = services.forms.create_author(form).await.unwrap();

    assert!(!outcome.is_persisted());
}

#[tokio::test]
async fn test_insert_failure_propagates() {
    let mut authors = MockAuthors::new();
    authors.expect_insert().times(1).returning(|_| Err(store_down()));
    let services = with_authors(authors);

    let form = AuthorForm {
        first_name: Some("Jane".to_string()),
        family_name: Some("Austen".to_string()),
        ..Default::default()
    };
    let result = services.forms.create_author(form).await;

    assert!(result.unwrap_err().is_store_failure());
}

#[tokio::test]
async fn test_detail_fails_when_any_read_fails() {
    let mut authors = MockAuthors::new();
    authors.expect_find_by_id().returning(|_| Err(store_down()));
    let services = with_authors(authors);

    let result = services.catalog.author_detail(Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::Store(_))));
}

#[tokio::test]
async fn test_guard_does_not_remove_when_check_fails() {
    let mut authors = MockAuthors::new();
    authors.expect_find_by_id().returning(|_| Err(store_down()));
    authors.expect_remove_by_id().never();
    let services = with_authors(authors);

    let result = services.integrity.delete_author(Uuid::new_v4()).await;

    assert!(result.unwrap_err().is_store_failure());
}

#[tokio::test]
async fn test_guard_treats_concurrent_removal_as_already_gone() {
    let id = Uuid::new_v4();
    let mut authors = MockAuthors::new();
    authors.expect_find_by_id().returning(|id| {
        Ok(Some(Author {
            id,
            first_name: "Jane".to_string(),
            family_name: "Austen".to_string(),
            ..Default::default()
        }))
    });
    authors
        .expect_remove_by_id()
        .times(1)
        .returning(|id| Err(AppError::NotFound(format!("Author {} not found", id))));
    let services = with_authors(authors);

    let outcome = services.integrity.delete_author(id).await.unwrap();

    assert!(matches!(
        outcome,
        catalog_server::services::integrity::DeleteOutcome::AlreadyGone
    ));
}

#[tokio::test]
async fn test_book_pick_lists_fail_as_a_whole() {
    let mut genres = MockGenres::new();
    genres.expect_find_all().returning(|_| Err(store_down()));
    let repository = Repository {
        genres: Arc::new(genres),
        ..Repository::in_memory()
    };
    let services = Services::new(repository);

    let result = services.catalog.book_form_choices(None, &[]).await;

    assert!(result.unwrap_err().is_store_failure());
}
