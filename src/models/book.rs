//! Book model and related types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    author::AuthorView,
    form::FieldValue,
    genre::GenreView,
};
use crate::repository::Document;

/// Stored book document.
///
/// `author` and `genre` hold raw ids; nothing in the store checks them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    /// Ordered genre ids
    pub genre: Vec<Uuid>,
}

impl Book {
    pub fn url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }
}

impl Document for Book {
    const COLLECTION: &'static str = "books";
    const LABEL: &'static str = "Book";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookView {
    pub id: Uuid,
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
    pub url: String,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author,
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.clone(),
            url: book.url(),
        }
    }
}

/// Book with its author and genres resolved.
///
/// References that no longer resolve are left out: `author` becomes `None`
/// and dangling genre ids are skipped.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PopulatedBook {
    pub book: BookView,
    pub author: Option<AuthorView>,
    pub genres: Vec<GenreView>,
}

/// Raw book form submission.
///
/// `genre` arrives as a single value or as a list, depending on how many
/// boxes were ticked.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookForm {
    pub title: Option<String>,
    /// Author id
    pub author: Option<String>,
    pub summary: Option<String>,
    pub isbn: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub genre: Option<FieldValue>,
}
