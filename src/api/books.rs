//! Book API endpoints

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookForm, PopulatedBook},
    services::catalog::{BookDetail, BookFormChoices},
    AppState,
};

use super::form_response;

/// Book form prefill with the author and genre pick-lists
#[derive(Serialize, ToSchema)]
pub struct BookFormPage {
    pub title: String,
    pub book: Option<Book>,
    pub choices: BookFormChoices,
}

/// List all books, sorted by title, with their author
#[utoipa::path(
    get,
    path = "/catalog/books",
    tag = "books",
    responses(
        (status = 200, description = "Book list", body = Vec<PopulatedBook>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<PopulatedBook>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get a book with its author, genres and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookDetail>> {
    let detail = state.services.catalog.book_detail(id).await?;
    Ok(Json(detail))
}

/// Empty book form with every author and genre to pick from
#[utoipa::path(
    get,
    path = "/catalog/book/create",
    tag = "books",
    responses(
        (status = 200, description = "Book form", body = BookFormPage)
    )
)]
pub async fn create_book_form(State(state): State<AppState>) -> AppResult<Json<BookFormPage>> {
    let choices = state.services.catalog.book_form_choices(None, &[]).await?;
    Ok(Json(BookFormPage {
        title: "Create Book".to_string(),
        book: None,
        choices,
    }))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/catalog/book/create",
    tag = "books",
    request_body = BookForm,
    responses(
        (status = 303, description = "Created, redirect to the book"),
        (status = 422, description = "Submission rejected, draft, violations and pick-lists for redisplay")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(form): Json<BookForm>,
) -> AppResult<Response> {
    let outcome = state.services.forms.create_book(form).await?;
    Ok(form_response(outcome, Book::url))
}

/// Book form prefilled with the stored book, its author and genres selected
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/update",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book form", body = BookFormPage),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookFormPage>> {
    let (book, choices) = state.services.catalog.book_for_update(id).await?;
    Ok(Json(BookFormPage {
        title: "Update Book".to_string(),
        book: Some(book),
        choices,
    }))
}

/// Update a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = BookForm,
    responses(
        (status = 303, description = "Updated, redirect to the book"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Submission rejected, draft, violations and pick-lists for redisplay")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<BookForm>,
) -> AppResult<Response> {
    let outcome = state.services.forms.update_book(id, form).await?;
    Ok(form_response(outcome, Book::url))
}
