//! Genre API endpoints

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
    models::{BookView, Genre, GenreForm, GenreView},
    services::{catalog::GenreDetail, integrity::DeleteOutcome},
    AppState,
};

use super::{form_response, see_other};

const GENRE_LIST_URL: &str = "/catalog/genres";

/// Genre form prefill
#[derive(Serialize, ToSchema)]
pub struct GenreFormPage {
    pub title: String,
    pub genre: Option<Genre>,
}

/// Genre with the books that reference it
#[derive(Serialize, ToSchema)]
pub struct GenreDeleteView {
    pub title: String,
    pub genre: GenreView,
    pub genre_books: Vec<BookView>,
}

impl GenreDeleteView {
    fn new(genre: &Genre, books: &[crate::models::Book]) -> Self {
        Self {
            title: "Delete Genre".to_string(),
            genre: GenreView::from(genre),
            genre_books: books.iter().map(BookView::from).collect(),
        }
    }
}

/// List all genres, sorted by name
#[utoipa::path(
    get,
    path = "/catalog/genres",
    tag = "genres",
    responses(
        (status = 200, description = "Genre list", body = Vec<GenreView>)
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<GenreView>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Get a genre and its books
#[utoipa::path(
    get,
    path = "/catalog/genre/{id}",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre details", body = GenreDetail),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<GenreDetail>> {
    let detail = state.services.catalog.genre_detail(id).await?;
    Ok(Json(detail))
}

/// Empty genre form
#[utoipa::path(
    get,
    path = "/catalog/genre/create",
    tag = "genres",
    responses(
        (status = 200, description = "Genre form", body = GenreFormPage)
    )
)]
pub async fn create_genre_form() -> Json<GenreFormPage> {
    Json(GenreFormPage {
        title: "Create Genre".to_string(),
        genre: None,
    })
}

/// Create a genre, or reuse the one with the same name
#[utoipa::path(
    post,
    path = "/catalog/genre/create",
    tag = "genres",
    request_body = GenreForm,
    responses(
        (status = 303, description = "Created or found, redirect to the genre"),
        (status = 422, description = "Submission rejected, draft and violations for redisplay")
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    Json(form): Json<GenreForm>,
) -> AppResult<Response> {
    let outcome = state.services.forms.create_genre(form).await?;
    Ok(form_response(outcome, Genre::url))
}

/// Genre form prefilled with the stored genre
#[utoipa::path(
    get,
    path = "/catalog/genre/{id}/update",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre form", body = GenreFormPage),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_genre_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<GenreFormPage>> {
    let genre = state.services.catalog.genre_for_update(id).await?;
    Ok(Json(GenreFormPage {
        title: "Update Genre".to_string(),
        genre: Some(genre),
    }))
}

/// Update a genre
#[utoipa::path(
    post,
    path = "/catalog/genre/{id}/update",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    request_body = GenreForm,
    responses(
        (status = 303, description = "Updated, redirect to the genre"),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Submission rejected, draft and violations for redisplay")
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<GenreForm>,
) -> AppResult<Response> {
    let outcome = state.services.forms.update_genre(id, form).await?;
    Ok(form_response(outcome, Genre::url))
}

/// Delete confirmation: the genre and the books that would block the delete
#[utoipa::path(
    get,
    path = "/catalog/genre/{id}/delete",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Delete confirmation", body = GenreDeleteView),
        (status = 303, description = "Genre already gone, redirect to the list")
    )
)]
pub async fn delete_genre_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let response = match state.services.integrity.genre_delete_confirmation(id).await? {
        Some(checked) => Json(GenreDeleteView::new(&checked.target, &checked.books)).into_response(),
        None => see_other(GENRE_LIST_URL),
    };
    Ok(response)
}

/// Delete a genre that no book references
#[utoipa::path(
    post,
    path = "/catalog/genre/{id}/delete",
    tag = "genres",
    params(("id" = Uuid, Path, description = "Genre ID")),
    responses(
        (status = 303, description = "Deleted (or already gone), redirect to the list"),
        (status = 409, description = "Books still reference the genre", body = GenreDeleteView)
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let response = match state.services.integrity.delete_genre(id).await? {
        DeleteOutcome::Deleted | DeleteOutcome::AlreadyGone => see_other(GENRE_LIST_URL),
        DeleteOutcome::Blocked(blocked) => (
            StatusCode::CONFLICT,
            Json(GenreDeleteView::new(&blocked.target, &blocked.books)),
        )
            .into_response(),
    };
    Ok(response)
}
