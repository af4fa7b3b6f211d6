//! Form submission pipeline.
//!
//! Every submission goes through the same steps:
//! 1. multi-value fields are normalized to sequences,
//! 2. all field rules run on the trimmed values and every violation is kept,
//! 3. a draft entity is built from the trimmed and HTML-escaped values,
//! 4. the draft is either returned for redisplay (with the sanitized
//!    submitted values and its pick-lists) or written to the store.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    error::AppResult,
    models::{
        Author, AuthorForm, Book, BookForm, BookInstance, BookInstanceForm, BookInstanceStatus,
        FieldValue, FieldViolation, FormOutcome, Genre, GenreForm, Redisplay,
    },
    repository::{Collection, Document, Filter, Repository},
    services::catalog::{BookFormChoices, BookInstanceFormChoices, CatalogService},
};

const AUTHOR_FIELDS: &[&str] = &["first_name", "family_name", "date_of_birth", "date_of_death"];
const GENRE_FIELDS: &[&str] = &["name"];
const BOOK_FIELDS: &[&str] = &["title", "author", "summary", "isbn", "genre"];
const BOOK_INSTANCE_FIELDS: &[&str] = &["book", "imprint", "status", "due_back"];

const NAME_MAX_LEN: usize = 100;

// ---------------------------------------------------------------------------
// Sanitizers
// ---------------------------------------------------------------------------

/// Trimmed value of an optional field; absent fields become empty
pub fn trim(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Replace HTML-significant characters with entities
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Parse an optional calendar date. Empty input is "no date", not an error.
pub fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map(Some)
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// ASCII letters and digits only, at most 100 characters. Empty values are
/// left to the length rule.
fn name_rules(value: &str, label: &'static str) -> Result<(), ValidationError> {
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(rule_error("alphanumeric", label));
    }
    if value.chars().count() > NAME_MAX_LEN {
        return Err(rule_error("length", "Names are limited to 100 characters."));
    }
    Ok(())
}

fn first_name_rules(value: &str) -> Result<(), ValidationError> {
    name_rules(value, "First name has non-alphanumeric characters.")
}

fn family_name_rules(value: &str) -> Result<(), ValidationError> {
    name_rules(value, "Family name has non-alphanumeric characters.")
}

#[derive(Debug, Validate)]
struct AuthorFields {
    #[validate(
        length(min = 1, message = "First name must be specified."),
        custom(function = "first_name_rules")
    )]
    first_name: String,
    #[validate(
        length(min = 1, message = "Family name must be specified."),
        custom(function = "family_name_rules")
    )]
    family_name: String,
}

#[derive(Debug, Validate)]
struct GenreFields {
    #[validate(length(min = 3, max = 100, message = "Genre name must contain between 3 and 100 characters."))]
    name: String,
}

#[derive(Debug, Validate)]
struct BookFields {
    #[validate(length(min = 1, message = "Title must not be empty."))]
    title: String,
    #[validate(length(min = 1, message = "Author must not be empty."))]
    author: String,
    #[validate(length(min = 1, message = "Summary must not be empty."))]
    summary: String,
    #[validate(length(min = 1, message = "ISBN must not be empty."))]
    isbn: String,
}

#[derive(Debug, Validate)]
struct BookInstanceFields {
    #[validate(length(min = 1, message = "Book must be specified."))]
    book: String,
    #[validate(length(min = 1, message = "Imprint must be specified."))]
    imprint: String,
}

/// Flatten validator output into violations
fn violations_from(result: Result<(), ValidationErrors>) -> Vec<FieldViolation> {
    let errors = match result {
        Ok(()) => return Vec::new(),
        Err(errors) => errors,
    };

    let mut violations = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {}", field));
            violations.push(FieldViolation::new(field.to_string(), message));
        }
    }
    violations
}

/// Put violations in form field order; rules of one field keep their order
fn sort_violations(violations: &mut [FieldViolation], order: &[&str]) {
    violations.sort_by_key(|v| {
        order
            .iter()
            .position(|field| *field == v.field)
            .unwrap_or(order.len())
    });
}

/// Parse a referenced id, recording a violation when it is not one
fn parse_reference(
    value: &str,
    field: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Uuid> {
    if value.is_empty() {
        return None;
    }
    match Uuid::parse_str(value) {
        Ok(id) => Some(id),
        Err(_) => {
            violations.push(FieldViolation::new(field, format!("'{}' is not a valid identifier.", value)));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FormService {
    repository: Repository,
    catalog: CatalogService,
}

impl FormService {
    pub fn new(repository: Repository, catalog: CatalogService) -> Self {
        Self { repository, catalog }
    }

    async fn save<T: Document>(
        collection: &dyn Collection<T>,
        id: Option<Uuid>,
        draft: T,
    ) -> AppResult<T> {
        let stored = match id {
            Some(id) => collection.replace_by_id(id, draft).await?,
            None => collection.insert(draft).await?,
        };
        tracing::info!(
            "Catalog form: {} id={} {}",
            T::LABEL,
            stored.id(),
            if id.is_some() { "updated" } else { "created" }
        );
        Ok(stored)
    }

    // ----- Author -----

    pub async fn create_author(&self, form: AuthorForm) -> AppResult<FormOutcome<Author>> {
        self.submit_author(None, form).await
    }

    pub async fn update_author(&self, id: Uuid, form: AuthorForm) -> AppResult<FormOutcome<Author>> {
        self.submit_author(Some(id), form).await
    }

    async fn submit_author(&self, id: Option<Uuid>, form: AuthorForm) -> AppResult<FormOutcome<Author>> {
        let fields = AuthorFields {
            first_name: trim(form.first_name.as_deref()),
            family_name: trim(form.family_name.as_deref()),
        };
        let birth = trim(form.date_of_birth.as_deref());
        let death = trim(form.date_of_death.as_deref());
        let mut violations = violations_from(fields.validate());

        let date_of_birth = parse_date(Some(&birth)).unwrap_or_else(|_| {
            violations.push(FieldViolation::new("date_of_birth", "Invalid date of birth."));
            None
        });
        let date_of_death = parse_date(Some(&death)).unwrap_or_else(|_| {
            violations.push(FieldViolation::new("date_of_death", "Invalid date of death."));
            None
        });
        sort_violations(&mut violations, AUTHOR_FIELDS);

        let draft = Author {
            id: id.unwrap_or_default(),
            first_name: escape(&fields.first_name),
            family_name: escape(&fields.family_name),
            date_of_birth,
            date_of_death,
        };

        if !violations.is_empty() {
            let values = IndexMap::from([
                ("first_name", FieldValue::One(draft.first_name.clone())),
                ("family_name", FieldValue::One(draft.family_name.clone())),
                ("date_of_birth", FieldValue::One(escape(&birth))),
                ("date_of_death", FieldValue::One(escape(&death))),
            ]);
            return Ok(FormOutcome::Invalid(Redisplay {
                draft,
                values,
                errors: violations,
                choices: (),
            }));
        }

        let stored = Self::save(self.repository.authors.as_ref(), id, draft).await?;
        Ok(FormOutcome::Persisted(stored))
    }

    // ----- Genre -----

    /// Create a genre, or return the existing one with the same name
    pub async fn create_genre(&self, form: GenreForm) -> AppResult<FormOutcome<Genre>> {
        let draft = match Self::check_genre(None, form) {
            Ok(draft) => draft,
            Err(redisplay) => return Ok(FormOutcome::Invalid(redisplay)),
        };

        let genre = self.find_or_create_genre(draft).await?;
        Ok(FormOutcome::Persisted(genre))
    }

    pub async fn update_genre(&self, id: Uuid, form: GenreForm) -> AppResult<FormOutcome<Genre>> {
        let draft = match Self::check_genre(Some(id), form) {
            Ok(draft) => draft,
            Err(redisplay) => return Ok(FormOutcome::Invalid(redisplay)),
        };

        let stored = Self::save(self.repository.genres.as_ref(), Some(id), draft).await?;
        Ok(FormOutcome::Persisted(stored))
    }

    /// Create and update share the same rules
    fn check_genre(id: Option<Uuid>, form: GenreForm) -> Result<Genre, Redisplay<Genre>> {
        let fields = GenreFields {
            name: trim(form.name.as_deref()),
        };
        let mut violations = violations_from(fields.validate());
        sort_violations(&mut violations, GENRE_FIELDS);

        let draft = Genre {
            id: id.unwrap_or_default(),
            name: escape(&fields.name),
        };
        if violations.is_empty() {
            return Ok(draft);
        }

        let values = IndexMap::from([("name", FieldValue::One(draft.name.clone()))]);
        Err(Redisplay {
            draft,
            values,
            errors: violations,
            choices: (),
        })
    }

    /// Look the genre up by its (sanitized) name and insert it only if absent
    pub async fn find_or_create_genre(&self, draft: Genre) -> AppResult<Genre> {
        let same_name = Filter::eq("name", &draft.name);
        if let Some(existing) = self.repository.genres.find_one(&same_name).await? {
            tracing::info!(
                "Catalog form: genre '{}' already exists (id={}), not creating a duplicate",
                existing.name,
                existing.id
            );
            return Ok(existing);
        }
        Self::save(self.repository.genres.as_ref(), None, draft).await
    }

    // ----- Book -----

    pub async fn create_book(&self, form: BookForm) -> AppResult<FormOutcome<Book, BookFormChoices>> {
        self.submit_book(None, form).await
    }

    pub async fn update_book(
        &self,
        id: Uuid,
        form: BookForm,
    ) -> AppResult<FormOutcome<Book, BookFormChoices>> {
        self.submit_book(Some(id), form).await
    }

    async fn submit_book(
        &self,
        id: Option<Uuid>,
        form: BookForm,
    ) -> AppResult<FormOutcome<Book, BookFormChoices>> {
        let genre_values: Vec<String> = FieldValue::normalize(form.genre)
            .iter()
            .map(|g| escape(g.trim()))
            .collect();

        let fields = BookFields {
            title: trim(form.title.as_deref()),
            author: trim(form.author.as_deref()),
            summary: trim(form.summary.as_deref()),
            isbn: trim(form.isbn.as_deref()),
        };
        let mut violations = violations_from(fields.validate());

        let author = parse_reference(&fields.author, "author", &mut violations);
        let genre: Vec<Uuid> = genre_values
            .iter()
            .filter_map(|g| {
                if g.is_empty() {
                    violations.push(FieldViolation::new("genre", "Genre must not contain empty entries."));
                    return None;
                }
                parse_reference(g, "genre", &mut violations)
            })
            .collect();

        // Only look the author up once everything else is valid
        if violations.is_empty() {
            if let Some(author_id) = author {
                if self.repository.authors.find_by_id(author_id).await?.is_none() {
                    violations.push(FieldViolation::new("author", "Author does not exist."));
                }
            }
        }
        sort_violations(&mut violations, BOOK_FIELDS);

        let draft = Book {
            id: id.unwrap_or_default(),
            title: escape(&fields.title),
            author: author.unwrap_or_default(),
            summary: escape(&fields.summary),
            isbn: escape(&fields.isbn),
            genre,
        };

        if !violations.is_empty() {
            let choices = self
                .catalog
                .book_form_choices(author, &draft.genre)
                .await?;
            let values = IndexMap::from([
                ("title", FieldValue::One(draft.title.clone())),
                ("author", FieldValue::One(escape(&fields.author))),
                ("summary", FieldValue::One(draft.summary.clone())),
                ("isbn", FieldValue::One(draft.isbn.clone())),
                ("genre", FieldValue::Many(genre_values)),
            ]);
            return Ok(FormOutcome::Invalid(Redisplay {
                draft,
                values,
                errors: violations,
                choices,
            }));
        }

        let stored = Self::save(self.repository.books.as_ref(), id, draft).await?;
        Ok(FormOutcome::Persisted(stored))
    }

    // ----- BookInstance -----

    pub async fn create_book_instance(
        &self,
        form: BookInstanceForm,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormChoices>> {
        self.submit_book_instance(None, form).await
    }

    pub async fn update_book_instance(
        &self,
        id: Uuid,
        form: BookInstanceForm,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormChoices>> {
        self.submit_book_instance(Some(id), form).await
    }

    async fn submit_book_instance(
        &self,
        id: Option<Uuid>,
        form: BookInstanceForm,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormChoices>> {
        let fields = BookInstanceFields {
            book: trim(form.book.as_deref()),
            imprint: trim(form.imprint.as_deref()),
        };
        let due_back_value = trim(form.due_back.as_deref());
        let mut violations = violations_from(fields.validate());

        let book = parse_reference(&fields.book, "book", &mut violations);

        let status_value = escape(&trim(form.status.as_deref()));
        let status = if status_value.is_empty() {
            BookInstanceStatus::default()
        } else {
            status_value.parse::<BookInstanceStatus>().unwrap_or_else(|_| {
                violations.push(FieldViolation::new(
                    "status",
                    "Status must be one of Available, Maintenance, Loaned, Reserved.",
                ));
                BookInstanceStatus::default()
            })
        };

        let due_back = parse_date(Some(&due_back_value))
            .unwrap_or_else(|_| {
                violations.push(FieldViolation::new("due_back", "Invalid date."));
                None
            })
            .unwrap_or_else(|| Utc::now().date_naive());

        if violations.is_empty() {
            if let Some(book_id) = book {
                if self.repository.books.find_by_id(book_id).await?.is_none() {
                    violations.push(FieldViolation::new("book", "Book does not exist."));
                }
            }
        }
        sort_violations(&mut violations, BOOK_INSTANCE_FIELDS);

        let draft = BookInstance {
            id: id.unwrap_or_default(),
            book: book.unwrap_or_default(),
            imprint: escape(&fields.imprint),
            status,
            due_back,
        };

        if !violations.is_empty() {
            let choices = self
                .catalog
                .book_instance_form_choices(book, status)
                .await?;
            let values = IndexMap::from([
                ("book", FieldValue::One(escape(&fields.book))),
                ("imprint", FieldValue::One(draft.imprint.clone())),
                ("status", FieldValue::One(status_value)),
                ("due_back", FieldValue::One(escape(&due_back_value))),
            ]);
            return Ok(FormOutcome::Invalid(Redisplay {
                draft,
                values,
                errors: violations,
                choices,
            }));
        }

        let stored = Self::save(self.repository.book_instances.as_ref(), id, draft).await?;
        Ok(FormOutcome::Persisted(stored))
    }
}
