//! Author API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, AuthorForm, AuthorView, BookView},
    services::{catalog::AuthorDetail, integrity::DeleteOutcome},
    AppState,
};

use super::{form_response, see_other};

const AUTHOR_LIST_URL: &str = "/catalog/authors";

/// Author form prefill
#[derive(Serialize, ToSchema)]
pub struct AuthorFormPage {
    pub title: String,
    pub author: Option<Author>,
}

/// Author with the books that reference it
#[derive(Serialize, ToSchema)]
pub struct AuthorDeleteView {
    pub title: String,
    pub author: AuthorView,
    pub author_books: Vec<BookView>,
}

/// List all authors, sorted by family name
#[utoipa::path(
    get,
    path = "/catalog/authors",
    tag = "authors",
    responses(
        (status = 200, description = "Author list", body = Vec<AuthorView>)
    )
)]
pub async fn list_authors(State(state): State<AppState>) -> AppResult<Json<Vec<AuthorView>>> {
    let authors = state.services.catalog.list_authors().await?;
    Ok(Json(authors))
}

/// Get an author and their books
#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AuthorDetail>> {
    let detail = state.services.catalog.author_detail(id).await?;
    Ok(Json(detail))
}

/// Empty author form
#[utoipa::path(
    get,
    path = "/catalog/author/create",
    tag = "authors",
    responses(
        (status = 200, description = "Author form", body = AuthorFormPage)
    )
)]
pub async fn create_author_form() -> Json<AuthorFormPage> {
    Json(AuthorFormPage {
        title: "Create Author".to_string(),
        author: None,
    })
}

/// Create an author
#[utoipa::path(
    post,
    path = "/catalog/author/create",
    tag = "authors",
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Created, redirect to the author"),
        (status = 422, description = "Submission rejected, draft and violations for redisplay")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Response> {
    let outcome = state.services.forms.create_author(form).await?;
    Ok(form_response(outcome, Author::url))
}

/// Author form prefilled with the stored author
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/update",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author form", body = AuthorFormPage),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AuthorFormPage>> {
    let author = state.services.catalog.author_for_update(id).await?;
    Ok(Json(AuthorFormPage {
        title: "Update Author".to_string(),
        author: Some(author),
    }))
}

/// Update an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Updated, redirect to the author"),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Submission rejected, draft and violations for redisplay")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Response> {
    let outcome = state.services.forms.update_author(id, form).await?;
    Ok(form_response(outcome, Author::url))
}

/// Delete confirmation: the author and the books that would block the delete
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/delete",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Delete confirmation", body = AuthorDeleteView),
        (status = 303, description = "Author already gone, redirect to the list")
    )
)]
pub async fn delete_author_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let response = match state.services.integrity.author_delete_confirmation(id).await? {
        Some(checked) => Json(AuthorDeleteView {
            title: "Delete Author".to_string(),
            author: AuthorView::from(&checked.target),
            author_books: checked.books.iter().map(BookView::from).collect(),
        })
        .into_response(),
        None => see_other(AUTHOR_LIST_URL),
    };
    Ok(response)
}

/// Delete an author that no book references
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 303, description = "Deleted (or already gone), redirect to the list"),
        (status = 409, description = "Books still reference the author", body = AuthorDeleteView)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let response = match state.services.integrity.delete_author(id).await? {
        DeleteOutcome::Deleted | DeleteOutcome::AlreadyGone => see_other(AUTHOR_LIST_URL),
        DeleteOutcome::Blocked(blocked) => (
            StatusCode::CONFLICT,
            Json(AuthorDeleteView {
                title: "Delete Author".to_string(),
                author: AuthorView::from(&blocked.target),
                author_books: blocked.books.iter().map(BookView::from).collect(),
            }),
        )
            .into_response(),
    };
    Ok(response)
}
