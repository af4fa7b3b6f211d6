//! Catalog read paths: lists, detail pages, populate and form prefill

use std::collections::{HashMap, HashSet};

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Author, AuthorView, Book, BookInstance, BookInstanceStatus, BookInstanceView, BookView,
        Genre, GenreView, PickListEntry, PopulatedBook, PopulatedBookInstance,
    },
    repository::{Filter, Projection, Repository, Sort},
};

use super::aggregate::fetch_all;

/// Fields of an author's books shown on the author page
const AUTHOR_BOOK_FIELDS: Projection = &["title", "summary"];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    pub author: AuthorView,
    pub books: Vec<BookView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenreDetail {
    pub genre: GenreView,
    pub books: Vec<BookView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub book: PopulatedBook,
    pub instances: Vec<BookInstanceView>,
}

/// Pick-lists of the book form
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BookFormChoices {
    pub authors: Vec<PickListEntry>,
    pub genres: Vec<PickListEntry>,
}

/// Pick-lists of the book instance form
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BookInstanceFormChoices {
    pub books: Vec<PickListEntry>,
    pub statuses: Vec<PickListEntry>,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    pub async fn list_authors(&self) -> AppResult<Vec<AuthorView>> {
        let authors = self
            .repository
            .authors
            .find_all(Some(Sort::asc("family_name")))
            .await?;
        Ok(authors.iter().map(AuthorView::from).collect())
    }

    pub async fn list_genres(&self) -> AppResult<Vec<GenreView>> {
        let genres = self.repository.genres.find_all(Some(Sort::asc("name"))).await?;
        Ok(genres.iter().map(GenreView::from).collect())
    }

    pub async fn list_books(&self) -> AppResult<Vec<PopulatedBook>> {
        let books = self.repository.books.find_all(Some(Sort::asc("title"))).await?;
        self.populate_books(books).await
    }

    pub async fn list_book_instances(&self) -> AppResult<Vec<PopulatedBookInstance>> {
        let instances = self.repository.book_instances.find_all(None).await?;
        self.populate_book_instances(instances).await
    }

    // ------------------------------------------------------------------
    // Details
    // ------------------------------------------------------------------

    pub async fn author_detail(&self, id: Uuid) -> AppResult<AuthorDetail> {
        let by_author = Filter::eq("author", id);
        let (author, books) = tokio::try_join!(
            self.repository.authors.find_by_id(id),
            self.repository.books.find_where(&by_author, Some(AUTHOR_BOOK_FIELDS)),
        )?;
        let author = author.ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;

        Ok(AuthorDetail {
            author: AuthorView::from(&author),
            books: books.iter().map(BookView::from).collect(),
        })
    }

    pub async fn genre_detail(&self, id: Uuid) -> AppResult<GenreDetail> {
        let in_genre = Filter::eq("genre", id);
        let (genre, books) = tokio::try_join!(
            self.repository.genres.find_by_id(id),
            self.repository.books.find_where(&in_genre, None),
        )?;
        let genre = genre.ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))?;

        Ok(GenreDetail {
            genre: GenreView::from(&genre),
            books: books.iter().map(BookView::from).collect(),
        })
    }

    pub async fn book_detail(&self, id: Uuid) -> AppResult<BookDetail> {
        let of_book = Filter::eq("book", id);
        let (book, instances) = tokio::try_join!(
            self.repository.books.find_by_id(id),
            self.repository.book_instances.find_where(&of_book, None),
        )?;
        let book = book.ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        Ok(BookDetail {
            book: self.populate_book(book).await?,
            instances: instances.iter().map(BookInstanceView::from).collect(),
        })
    }

    pub async fn book_instance_detail(&self, id: Uuid) -> AppResult<PopulatedBookInstance> {
        let instance = self
            .repository
            .book_instances
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))?;
        self.populate_book_instance(instance).await
    }

    // ------------------------------------------------------------------
    // Populate
    // ------------------------------------------------------------------

    pub async fn populate_book(&self, book: Book) -> AppResult<PopulatedBook> {
        let mut populated = self.populate_books(vec![book]).await?;
        populated
            .pop()
            .ok_or_else(|| AppError::Internal("Populating a book returned nothing".to_string()))
    }

    /// Resolve authors and genres of many books with one lookup per collection
    pub async fn populate_books(&self, books: Vec<Book>) -> AppResult<Vec<PopulatedBook>> {
        if books.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: HashSet<Uuid> = books.iter().map(|b| b.author).collect();
        let genre_ids: HashSet<Uuid> = books.iter().flat_map(|b| b.genre.iter().copied()).collect();
        let authors_filter = Filter::any_of("id", author_ids);
        let genres_filter = Filter::any_of("id", genre_ids);

        let (authors, genres) = tokio::try_join!(
            self.repository.authors.find_where(&authors_filter, None),
            self.repository.genres.find_where(&genres_filter, None),
        )?;
        let authors: HashMap<Uuid, Author> = authors.into_iter().map(|a| (a.id, a)).collect();
        let genres: HashMap<Uuid, Genre> = genres.into_iter().map(|g| (g.id, g)).collect();

        Ok(books
            .iter()
            .map(|book| PopulatedBook {
                book: BookView::from(book),
                author: authors.get(&book.author).map(AuthorView::from),
                genres: book
                    .genre
                    .iter()
                    .filter_map(|id| genres.get(id))
                    .map(GenreView::from)
                    .collect(),
            })
            .collect())
    }

    pub async fn populate_book_instance(&self, instance: BookInstance) -> AppResult<PopulatedBookInstance> {
        let book = self.repository.books.find_by_id(instance.book).await?;
        Ok(PopulatedBookInstance {
            instance: BookInstanceView::from(&instance),
            book: book.as_ref().map(BookView::from),
        })
    }

    pub async fn populate_book_instances(
        &self,
        instances: Vec<BookInstance>,
    ) -> AppResult<Vec<PopulatedBookInstance>> {
        if instances.is_empty() {
            return Ok(Vec::new());
        }

        let book_ids: HashSet<Uuid> = instances.iter().map(|i| i.book).collect();
        let books: HashMap<Uuid, Book> = self
            .repository
            .books
            .find_where(&Filter::any_of("id", book_ids), None)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(instances
            .iter()
            .map(|instance| PopulatedBookInstance {
                instance: BookInstanceView::from(instance),
                book: books.get(&instance.book).map(BookView::from),
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Form prefill
    // ------------------------------------------------------------------

    pub async fn author_for_update(&self, id: Uuid) -> AppResult<Author> {
        self.repository
            .authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    pub async fn genre_for_update(&self, id: Uuid) -> AppResult<Genre> {
        self.repository
            .genres
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    /// All authors and genres, with the given references marked as selected
    pub async fn book_form_choices(
        &self,
        selected_author: Option<Uuid>,
        selected_genres: &[Uuid],
    ) -> AppResult<BookFormChoices> {
        let authors: BoxFuture<'_, AppResult<Vec<PickListEntry>>> = async move {
            let authors = self.repository.authors.find_all(Some(Sort::asc("family_name"))).await?;
            Ok(author_choices(&authors, selected_author))
        }
        .boxed();
        let genres: BoxFuture<'_, AppResult<Vec<PickListEntry>>> = async move {
            let genres = self.repository.genres.find_all(Some(Sort::asc("name"))).await?;
            Ok(genre_choices(&genres, selected_genres))
        }
        .boxed();

        let mut lists = fetch_all([("authors", authors), ("genres", genres)]).await?;
        Ok(BookFormChoices {
            authors: lists.swap_remove("authors").unwrap_or_default(),
            genres: lists.swap_remove("genres").unwrap_or_default(),
        })
    }

    pub async fn book_for_update(&self, id: Uuid) -> AppResult<(Book, BookFormChoices)> {
        let (book, authors, genres) = tokio::try_join!(
            self.repository.books.find_by_id(id),
            self.repository.authors.find_all(Some(Sort::asc("family_name"))),
            self.repository.genres.find_all(Some(Sort::asc("name"))),
        )?;
        let book = book.ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        let choices = BookFormChoices {
            authors: author_choices(&authors, Some(book.author)),
            genres: genre_choices(&genres, &book.genre),
        };
        Ok((book, choices))
    }

    /// All books and statuses, with the given book and status marked as selected
    pub async fn book_instance_form_choices(
        &self,
        selected_book: Option<Uuid>,
        selected_status: BookInstanceStatus,
    ) -> AppResult<BookInstanceFormChoices> {
        let books = self.repository.books.find_all(Some(Sort::asc("title"))).await?;
        Ok(BookInstanceFormChoices {
            books: book_choices(&books, selected_book),
            statuses: status_choices(selected_status),
        })
    }

    pub async fn book_instance_for_update(&self, id: Uuid) -> AppResult<(BookInstance, BookInstanceFormChoices)> {
        let (instance, books) = tokio::try_join!(
            self.repository.book_instances.find_by_id(id),
            self.repository.books.find_all(Some(Sort::asc("title"))),
        )?;
        let instance =
            instance.ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))?;

        let choices = BookInstanceFormChoices {
            books: book_choices(&books, Some(instance.book)),
            statuses: status_choices(instance.status),
        };
        Ok((instance, choices))
    }
}

fn author_choices(authors: &[Author], selected: Option<Uuid>) -> Vec<PickListEntry> {
    authors
        .iter()
        .map(|author| PickListEntry {
            id: author.id.to_string(),
            label: author.display_name(),
            selected: Some(author.id) == selected,
        })
        .collect()
}

fn genre_choices(genres: &[Genre], selected: &[Uuid]) -> Vec<PickListEntry> {
    genres
        .iter()
        .map(|genre| PickListEntry {
            id: genre.id.to_string(),
            label: genre.name.clone(),
            selected: selected.contains(&genre.id),
        })
        .collect()
}

fn book_choices(books: &[Book], selected: Option<Uuid>) -> Vec<PickListEntry> {
    books
        .iter()
        .map(|book| PickListEntry {
            id: book.id.to_string(),
            label: book.title.clone(),
            selected: Some(book.id) == selected,
        })
        .collect()
}

fn status_choices(selected: BookInstanceStatus) -> Vec<PickListEntry> {
    BookInstanceStatus::ALL
        .iter()
        .map(|status| PickListEntry {
            id: status.as_str().to_string(),
            label: status.to_string(),
            selected: *status == selected,
        })
        .collect()
}
