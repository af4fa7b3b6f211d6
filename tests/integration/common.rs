//! Shared fixtures

use chrono::NaiveDate;
use uuid::Uuid;

use catalog_server::{
    models::{Author, Book, BookInstance, BookInstanceStatus, Genre},
    repository::Repository,
    services::Services,
};

pub fn services() -> (Repository, Services) {
    let repository = Repository::in_memory();
    let services = Services::new(repository.clone());
    (repository, services)
}

pub async fn seed_author(repository: &Repository, first_name: &str, family_name: &str) -> Author {
    repository
        .authors
        .insert(Author {
            first_name: first_name.to_string(),
            family_name: family_name.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn seed_genre(repository: &Repository, name: &str) -> Genre {
    repository
        .genres
        .insert(Genre {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn seed_book(repository: &Repository, title: &str, author: Uuid, genre: Vec<Uuid>) -> Book {
    repository
        .books
        .insert(Book {
            title: title.to_string(),
            author,
            summary: format!("Summary of {}", title),
            isbn: "9780141439518".to_string(),
            genre,
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn seed_copy(repository: &Repository, book: Uuid, status: BookInstanceStatus) -> BookInstance {
    repository
        .book_instances
        .insert(BookInstance {
            id: Uuid::nil(),
            book,
            imprint: "Penguin Classics, 2003".to_string(),
            status,
            due_back: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        })
        .await
        .unwrap()
}
