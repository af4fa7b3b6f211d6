//! HTTP round-trips through the router

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use catalog_server::{api, repository::Repository, AppState};

use crate::common::{seed_author, seed_book, seed_genre};

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: Value,
}

fn app() -> (Repository, Router) {
    let repository = Repository::in_memory();
    let state = AppState::new(repository.clone());
    (repository, api::router(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Reply { status, location, body }
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (_, app) = app();

    let health = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    let ready = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["status"], "ready");
}

#[tokio::test]
async fn test_home_page_summary() {
    let (repository, app) = app();
    seed_genre(&repository, "Fantasy").await;

    let reply = send(&app, Method::GET, "/catalog", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["title"], "Local Library Home");
    assert_eq!(reply.body["data"]["genre_count"], 1);
    assert_eq!(reply.body["error"], Value::Null);
}

#[tokio::test]
async fn test_create_author_redirects_to_the_author() {
    let (repository, app) = app();

    let reply = send(
        &app,
        Method::POST,
        "/catalog/author/create",
        Some(json!({ "first_name": "Jane", "family_name": "Austen", "date_of_birth": "1775-12-16" })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let location = reply.location.unwrap();
    let id: Uuid = location.trim_start_matches("/catalog/author/").parse().unwrap();
    assert!(repository.authors.find_by_id(id).await.unwrap().is_some());

    let detail = send(&app, Method::GET, &location, None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["author"]["name"], "Austen, Jane");
    assert_eq!(detail.body["author"]["lifespan"], "1775");
}

#[tokio::test]
async fn test_rejected_author_is_unprocessable() {
    let (_, app) = app();

    let reply = send(
        &app,
        Method::POST,
        "/catalog/author/create",
        Some(json!({ "first_name": "", "family_name": "Austen" })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.body["errors"][0]["field"], "first_name");
    assert_eq!(reply.body["draft"]["family_name"], "Austen");
    assert_eq!(reply.body["values"]["first_name"], "");
    assert_eq!(reply.body["values"]["date_of_birth"], "");
}

#[tokio::test]
async fn test_book_form_accepts_single_and_multiple_genres() {
    let (repository, app) = app();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let fiction = seed_genre(&repository, "Fiction").await;
    let romance = seed_genre(&repository, "Romance").await;

    for genre in [json!(fiction.id), json!([fiction.id, romance.id])] {
        let reply = send(
            &app,
            Method::POST,
            "/catalog/book/create",
            Some(json!({
                "title": "Emma",
                "author": author.id,
                "summary": "Matchmaking",
                "isbn": "9780141439587",
                "genre": genre,
            })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
    }

    let books = send(&app, Method::GET, "/catalog/books", None).await;
    assert_eq!(books.body.as_array().unwrap().len(), 2);
    assert_eq!(books.body[0]["author"]["name"], "Austen, Jane");
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let (_, app) = app();
    let id = Uuid::new_v4();

    for uri in [
        format!("/catalog/author/{}", id),
        format!("/catalog/genre/{}", id),
        format!("/catalog/book/{}", id),
        format!("/catalog/bookinstance/{}", id),
        format!("/catalog/book/{}/update", id),
    ] {
        let reply = send(&app, Method::GET, &uri, None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(reply.body["error"], "NoSuchData");
    }
}

#[tokio::test]
async fn test_blocked_genre_delete_is_conflict() {
    let (repository, app) = app();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let fiction = seed_genre(&repository, "Fiction").await;
    seed_book(&repository, "Emma", author.id, vec![fiction.id]).await;
    let uri = format!("/catalog/genre/{}/delete", fiction.id);

    let confirmation = send(&app, Method::GET, &uri, None).await;
    assert_eq!(confirmation.status, StatusCode::OK);
    assert_eq!(confirmation.body["genre_books"][0]["title"], "Emma");

    let reply = send(&app, Method::POST, &uri, None).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["genre"]["name"], "Fiction");
    assert!(repository.genres.find_by_id(fiction.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_author_delete_redirects_to_the_list() {
    let (repository, app) = app();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let uri = format!("/catalog/author/{}/delete", author.id);

    let reply = send(&app, Method::POST, &uri, None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/catalog/authors"));

    // Gone now: the confirmation page sends the user back to the list
    let again = send(&app, Method::GET, &uri, None).await;
    assert_eq!(again.status, StatusCode::SEE_OTHER);
    assert_eq!(again.location.as_deref(), Some("/catalog/authors"));
}

#[tokio::test]
async fn test_book_cannot_be_deleted() {
    let (repository, app) = app();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let book = seed_book(&repository, "Emma", author.id, vec![]).await;

    let reply = send(&app, Method::POST, &format!("/catalog/book/{}/delete", book.id), None).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(repository.books.find_by_id(book.id).await.unwrap().is_some());
}
