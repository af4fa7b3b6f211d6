//! Book instance (copy) API endpoints

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{BookInstance, BookInstanceForm, BookInstanceStatus, PopulatedBookInstance},
    services::catalog::BookInstanceFormChoices,
    AppState,
};

use super::{form_response, see_other};

const BOOK_INSTANCE_LIST_URL: &str = "/catalog/bookinstances";

/// Book instance form prefill with the book and status pick-lists
#[derive(Serialize, ToSchema)]
pub struct BookInstanceFormPage {
    pub title: String,
    pub book_instance: Option<BookInstance>,
    pub choices: BookInstanceFormChoices,
}

/// List all copies with their book
#[utoipa::path(
    get,
    path = "/catalog/bookinstances",
    tag = "book_instances",
    responses(
        (status = 200, description = "Book instance list", body = Vec<PopulatedBookInstance>)
    )
)]
pub async fn list_book_instances(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PopulatedBookInstance>>> {
    let instances = state.services.catalog.list_book_instances().await?;
    Ok(Json(instances))
}

/// Get a copy with its book
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}",
    tag = "book_instances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Book instance details", body = PopulatedBookInstance),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book_instance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PopulatedBookInstance>> {
    let instance = state.services.catalog.book_instance_detail(id).await?;
    Ok(Json(instance))
}

/// Empty book instance form with every book and status to pick from
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/create",
    tag = "book_instances",
    responses(
        (status = 200, description = "Book instance form", body = BookInstanceFormPage)
    )
)]
pub async fn create_book_instance_form(
    State(state): State<AppState>,
) -> AppResult<Json<BookInstanceFormPage>> {
    let choices = state
        .services
        .catalog
        .book_instance_form_choices(None, BookInstanceStatus::default())
        .await?;
    Ok(Json(BookInstanceFormPage {
        title: "Create BookInstance".to_string(),
        book_instance: None,
        choices,
    }))
}

/// Create a copy
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/create",
    tag = "book_instances",
    request_body = BookInstanceForm,
    responses(
        (status = 303, description = "Created, redirect to the copy"),
        (status = 422, description = "Submission rejected, draft, violations and pick-lists for redisplay")
    )
)]
pub async fn create_book_instance(
    State(state): State<AppState>,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Response> {
    let outcome = state.services.forms.create_book_instance(form).await?;
    Ok(form_response(outcome, BookInstance::url))
}

/// Book instance form prefilled with the stored copy
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}/update",
    tag = "book_instances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Book instance form", body = BookInstanceFormPage),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book_instance_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceFormPage>> {
    let (instance, choices) = state.services.catalog.book_instance_for_update(id).await?;
    Ok(Json(BookInstanceFormPage {
        title: "Update BookInstance".to_string(),
        book_instance: Some(instance),
        choices,
    }))
}

/// Update a copy
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/update",
    tag = "book_instances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = BookInstanceForm,
    responses(
        (status = 303, description = "Updated, redirect to the copy"),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Submission rejected, draft, violations and pick-lists for redisplay")
    )
)]
pub async fn update_book_instance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Response> {
    let outcome = state.services.forms.update_book_instance(id, form).await?;
    Ok(form_response(outcome, BookInstance::url))
}

/// Delete confirmation for a copy
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}/delete",
    tag = "book_instances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Delete confirmation", body = PopulatedBookInstance),
        (status = 303, description = "Copy already gone, redirect to the list")
    )
)]
pub async fn delete_book_instance_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let response = match state.services.integrity.book_instance_delete_confirmation(id).await? {
        Some(instance) => Json(instance).into_response(),
        None => see_other(BOOK_INSTANCE_LIST_URL),
    };
    Ok(response)
}

/// Delete a copy
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/delete",
    tag = "book_instances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 303, description = "Deleted (or already gone), redirect to the list")
    )
)]
pub async fn delete_book_instance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    // Copies have no dependents, so the outcome is never Blocked
    state.services.integrity.delete_book_instance(id).await?;
    Ok(see_other(BOOK_INSTANCE_LIST_URL))
}
