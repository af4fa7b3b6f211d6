//! Form pipeline tests

use catalog_server::{
    error::AppError,
    models::{
        AuthorForm, BookForm, BookInstanceForm, BookInstanceStatus, FieldValue, FormOutcome,
        GenreForm, Redisplay,
    },
    repository::Filter,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::common::{seed_author, seed_book, seed_copy, seed_genre, services};

fn persisted<T, C>(outcome: FormOutcome<T, C>) -> T {
    match outcome {
        FormOutcome::Persisted(entity) => entity,
        FormOutcome::Invalid(_) => panic!("expected the submission to be persisted"),
    }
}

fn invalid<T, C>(outcome: FormOutcome<T, C>) -> Redisplay<T, C> {
    match outcome {
        FormOutcome::Invalid(redisplay) => redisplay,
        FormOutcome::Persisted(_) => panic!("expected the submission to be rejected"),
    }
}

fn fields<T, C>(redisplay: &Redisplay<T, C>) -> Vec<&str> {
    redisplay.errors.iter().map(|v| v.field.as_str()).collect()
}

fn author_form(first_name: &str, family_name: &str) -> AuthorForm {
    AuthorForm {
        first_name: Some(first_name.to_string()),
        family_name: Some(family_name.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_author_stores_trimmed_values() {
    let (repository, services) = services();
    let form = AuthorForm {
        first_name: Some("  Jane ".to_string()),
        family_name: Some("Austen\t".to_string()),
        date_of_birth: Some("1775-12-16".to_string()),
        date_of_death: Some(String::new()),
    };

    let author = persisted(services.forms.create_author(form).await.unwrap());

    assert_eq!(author.first_name, "Jane");
    assert_eq!(author.family_name, "Austen");
    assert_eq!(author.date_of_birth, NaiveDate::from_ymd_opt(1775, 12, 16));
    assert_eq!(author.date_of_death, None);
    assert!(repository.authors.find_by_id(author.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_missing_first_name_is_reported_and_nothing_is_stored() {
    let (repository, services) = services();

    let redisplay = invalid(services.forms.create_author(author_form("   ", "Austen")).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["first_name"]);
    assert_eq!(redisplay.errors[0].message, "First name must be specified.");
    assert_eq!(redisplay.draft.family_name, "Austen");
    assert_eq!(repository.authors.count(&Filter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_every_violation_is_collected_in_field_order() {
    let (_, services) = services();
    let form = AuthorForm {
        first_name: None,
        family_name: Some("Brontë".to_string()),
        date_of_birth: Some("sometime".to_string()),
        date_of_death: Some("1848-12-19".to_string()),
    };

    let redisplay = invalid(services.forms.create_author(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["first_name", "family_name", "date_of_birth"]);
    assert_eq!(redisplay.errors[1].message, "Family name has non-alphanumeric characters.");
    assert_eq!(redisplay.errors[2].message, "Invalid date of birth.");
}

#[tokio::test]
async fn test_update_author_keeps_id() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austin").await;

    let updated = persisted(
        services
            .forms
            .update_author(author.id, author_form("Jane", "Austen"))
            .await
            .unwrap(),
    );

    assert_eq!(updated.id, author.id);
    let stored = repository.authors.find_by_id(author.id).await.unwrap().unwrap();
    assert_eq!(stored.family_name, "Austen");
    assert_eq!(repository.authors.count(&Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_of_missing_author_is_not_found() {
    let (_, services) = services();
    let result = services
        .forms
        .update_author(Uuid::new_v4(), author_form("Jane", "Austen"))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_update_keeps_id_on_draft() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austen").await;

    let redisplay = invalid(
        services
            .forms
            .update_author(author.id, author_form("", "Austen"))
            .await
            .unwrap(),
    );
    assert_eq!(redisplay.draft.id, author.id);
}

#[tokio::test]
async fn test_create_genre_returns_existing_genre_with_same_name() {
    let (repository, services) = services();
    let form = |name: &str| GenreForm {
        name: Some(name.to_string()),
    };

    let first = persisted(services.forms.create_genre(form("Fantasy")).await.unwrap());
    let second = persisted(services.forms.create_genre(form("  Fantasy  ")).await.unwrap());

    assert_eq!(first.id, second.id);
    assert_eq!(repository.genres.count(&Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn test_genre_name_length_rule_applies_to_create_and_update() {
    let (repository, services) = services();
    let genre = seed_genre(&repository, "Poetry").await;
    let short = || GenreForm {
        name: Some("SF".to_string()),
    };

    let created = invalid(services.forms.create_genre(short()).await.unwrap());
    let updated = invalid(services.forms.update_genre(genre.id, short()).await.unwrap());

    assert_eq!(fields(&created), vec!["name"]);
    assert_eq!(fields(&updated), vec!["name"]);
    let stored = repository.genres.find_by_id(genre.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Poetry");
}

#[tokio::test]
async fn test_create_book_escapes_text_fields() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let form = BookForm {
        title: Some(" Pride & Prejudice ".to_string()),
        author: Some(author.id.to_string()),
        summary: Some("<i>Classic</i>".to_string()),
        isbn: Some("9780141439518".to_string()),
        genre: None,
    };

    let book = persisted(services.forms.create_book(form).await.unwrap());

    assert_eq!(book.title, "Pride &amp; Prejudice");
    assert_eq!(book.summary, "&lt;i&gt;Classic&lt;&#x2F;i&gt;");
    assert_eq!(book.author, author.id);
    assert!(book.genre.is_empty());
}

#[tokio::test]
async fn test_book_genre_is_normalized() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let fantasy = seed_genre(&repository, "Fantasy").await;
    let poetry = seed_genre(&repository, "Poetry").await;

    let form = |genre: Option<FieldValue>| BookForm {
        title: Some("Emma".to_string()),
        author: Some(author.id.to_string()),
        summary: Some("Matchmaking".to_string()),
        isbn: Some("9780141439587".to_string()),
        genre,
    };

    let single = persisted(
        services
            .forms
            .create_book(form(Some(FieldValue::One(fantasy.id.to_string()))))
            .await
            .unwrap(),
    );
    assert_eq!(single.genre, vec![fantasy.id]);

    let many = persisted(
        services
            .forms
            .create_book(form(Some(FieldValue::Many(vec![
                poetry.id.to_string(),
                fantasy.id.to_string(),
            ]))))
            .await
            .unwrap(),
    );
    assert_eq!(many.genre, vec![poetry.id, fantasy.id]);
}

#[tokio::test]
async fn test_invalid_book_redisplays_pick_lists_with_selection() {
    let (repository, services) = services();
    let austen = seed_author(&repository, "Jane", "Austen").await;
    seed_author(&repository, "Charlotte", "Bronte").await;
    let fantasy = seed_genre(&repository, "Fantasy").await;
    seed_genre(&repository, "Poetry").await;

    let form = BookForm {
        title: None,
        author: Some(austen.id.to_string()),
        summary: Some("Matchmaking".to_string()),
        isbn: None,
        genre: Some(FieldValue::One(fantasy.id.to_string())),
    };

    let redisplay = invalid(services.forms.create_book(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["title", "isbn"]);
    assert_eq!(redisplay.choices.authors.len(), 2);
    let selected_authors: Vec<_> = redisplay
        .choices
        .authors
        .iter()
        .filter(|entry| entry.selected)
        .map(|entry| entry.id.clone())
        .collect();
    assert_eq!(selected_authors, vec![austen.id.to_string()]);
    let selected_genres: Vec<_> = redisplay
        .choices
        .genres
        .iter()
        .filter(|entry| entry.selected)
        .map(|entry| entry.label.clone())
        .collect();
    assert_eq!(selected_genres, vec!["Fantasy"]);
    assert_eq!(repository.books.count(&Filter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_book_with_unknown_author_is_rejected() {
    let (repository, services) = services();
    let form = BookForm {
        title: Some("Emma".to_string()),
        author: Some(Uuid::new_v4().to_string()),
        summary: Some("Matchmaking".to_string()),
        isbn: Some("9780141439587".to_string()),
        genre: None,
    };

    let redisplay = invalid(services.forms.create_book(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["author"]);
    assert_eq!(repository.books.count(&Filter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_book_instance_without_status_is_maintenance() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let book = seed_book(&repository, "Emma", author.id, vec![]).await;

    let form = BookInstanceForm {
        book: Some(book.id.to_string()),
        imprint: Some("Penguin, 2003".to_string()),
        status: None,
        due_back: Some("2026-11-30".to_string()),
    };
    let instance = persisted(services.forms.create_book_instance(form).await.unwrap());

    assert_eq!(instance.status, BookInstanceStatus::Maintenance);
    assert_eq!(instance.due_back, NaiveDate::from_ymd_opt(2026, 11, 30).unwrap());
    let stored = repository.book_instances.find_by_id(instance.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookInstanceStatus::Maintenance);
}

#[tokio::test]
async fn test_book_instance_with_unknown_status_is_rejected() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let book = seed_book(&repository, "Emma", author.id, vec![]).await;

    let form = BookInstanceForm {
        book: Some(book.id.to_string()),
        imprint: None,
        status: Some("Lost".to_string()),
        due_back: Some("30/11/2026".to_string()),
    };
    let redisplay = invalid(services.forms.create_book_instance(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["imprint", "status", "due_back"]);
    assert_eq!(redisplay.choices.books.len(), 1);
    assert!(redisplay.choices.books[0].selected);
    assert_eq!(redisplay.choices.statuses.len(), 4);
    assert_eq!(repository.book_instances.count(&Filter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_rejected_book_echoes_malformed_references_in_order() {
    let (repository, services) = services();
    let fantasy = seed_genre(&repository, "Fantasy").await;

    let form = BookForm {
        title: Some("Emma".to_string()),
        author: Some(" not-an-id ".to_string()),
        summary: Some("Matchmaking".to_string()),
        isbn: Some("9780141439587".to_string()),
        genre: Some(FieldValue::Many(vec!["bogus".to_string(), fantasy.id.to_string()])),
    };

    let redisplay = invalid(services.forms.create_book(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["author", "genre"]);
    assert_eq!(redisplay.values["author"], FieldValue::One("not-an-id".to_string()));
    assert_eq!(
        redisplay.values["genre"],
        FieldValue::Many(vec!["bogus".to_string(), fantasy.id.to_string()])
    );
    let order: Vec<_> = redisplay.values.keys().copied().collect();
    assert_eq!(order, vec!["title", "author", "summary", "isbn", "genre"]);
    // The parsable genre is still ticked in the picker
    assert!(redisplay.choices.genres[0].selected);
}

#[tokio::test]
async fn test_rejected_author_echoes_unparseable_date() {
    let (_, services) = services();
    let form = AuthorForm {
        date_of_birth: Some("1775-13-40".to_string()),
        ..author_form("Jane", "Austen")
    };

    let redisplay = invalid(services.forms.create_author(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["date_of_birth"]);
    assert_eq!(redisplay.draft.date_of_birth, None);
    assert_eq!(redisplay.values["date_of_birth"], FieldValue::One("1775-13-40".to_string()));
    assert_eq!(redisplay.values["date_of_death"], FieldValue::One(String::new()));
}

#[tokio::test]
async fn test_empty_genre_entry_is_reported() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let fantasy = seed_genre(&repository, "Fantasy").await;

    let form = BookForm {
        title: Some("Emma".to_string()),
        author: Some(author.id.to_string()),
        summary: Some("Matchmaking".to_string()),
        isbn: Some("9780141439587".to_string()),
        genre: Some(FieldValue::Many(vec![" ".to_string(), fantasy.id.to_string()])),
    };

    let redisplay = invalid(services.forms.create_book(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["genre"]);
    assert_eq!(redisplay.errors[0].message, "Genre must not contain empty entries.");
    assert_eq!(
        redisplay.values["genre"],
        FieldValue::Many(vec![String::new(), fantasy.id.to_string()])
    );
    assert_eq!(repository.books.count(&Filter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_book_keeps_id() {
    let (repository, services) = services();
    let austen = seed_author(&repository, "Jane", "Austen").await;
    let bronte = seed_author(&repository, "Charlotte", "Bronte").await;
    let book = seed_book(&repository, "Emma", austen.id, vec![]).await;

    let form = BookForm {
        title: Some("Jane Eyre".to_string()),
        author: Some(bronte.id.to_string()),
        summary: Some("Governess".to_string()),
        isbn: Some("9780141441146".to_string()),
        genre: None,
    };
    let updated = persisted(services.forms.update_book(book.id, form).await.unwrap());

    assert_eq!(updated.id, book.id);
    let stored = repository.books.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Jane Eyre");
    assert_eq!(stored.author, bronte.id);
    assert_eq!(repository.books.count(&Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_book_instance_keeps_id() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austen").await;
    let book = seed_book(&repository, "Emma", author.id, vec![]).await;
    let copy = seed_copy(&repository, book.id, BookInstanceStatus::Available).await;

    let form = BookInstanceForm {
        book: Some(book.id.to_string()),
        imprint: Some("Penguin, 2003".to_string()),
        status: Some("Loaned".to_string()),
        due_back: Some("2026-12-01".to_string()),
    };
    let updated = persisted(services.forms.update_book_instance(copy.id, form).await.unwrap());

    assert_eq!(updated.id, copy.id);
    let stored = repository.book_instances.find_by_id(copy.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookInstanceStatus::Loaned);
    assert_eq!(stored.due_back, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
    assert_eq!(repository.book_instances.count(&Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn test_book_instance_with_unknown_book_is_rejected() {
    let (repository, services) = services();
    let form = BookInstanceForm {
        book: Some(Uuid::new_v4().to_string()),
        imprint: Some("Penguin, 2003".to_string()),
        status: Some("Available".to_string()),
        due_back: None,
    };

    let redisplay = invalid(services.forms.create_book_instance(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["book"]);
    assert_eq!(redisplay.errors[0].message, "Book does not exist.");
    assert_eq!(repository.book_instances.count(&Filter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_book_instance_redisplays_book_picker_with_selection() {
    let (repository, services) = services();
    let author = seed_author(&repository, "Jane", "Austen").await;
    seed_book(&repository, "Emma", author.id, vec![]).await;
    let persuasion = seed_book(&repository, "Persuasion", author.id, vec![]).await;

    let form = BookInstanceForm {
        book: Some(persuasion.id.to_string()),
        imprint: None,
        status: Some("Reserved".to_string()),
        due_back: None,
    };
    let redisplay = invalid(services.forms.create_book_instance(form).await.unwrap());

    assert_eq!(fields(&redisplay), vec!["imprint"]);
    let selected_books: Vec<_> = redisplay
        .choices
        .books
        .iter()
        .filter(|entry| entry.selected)
        .map(|entry| entry.label.clone())
        .collect();
    assert_eq!(selected_books, vec!["Persuasion"]);
    assert_eq!(redisplay.choices.books.len(), 2);
    let selected_statuses: Vec<_> = redisplay
        .choices
        .statuses
        .iter()
        .filter(|entry| entry.selected)
        .map(|entry| entry.id.clone())
        .collect();
    assert_eq!(selected_statuses, vec!["Reserved"]);
    assert_eq!(redisplay.values["book"], FieldValue::One(persuasion.id.to_string()));
}
