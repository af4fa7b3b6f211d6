//! Book instance (physical copy) model and related types

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::book::BookView;
use crate::repository::Document;

/// Copy availability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookInstanceStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl BookInstanceStatus {
    pub const ALL: [BookInstanceStatus; 4] = [
        BookInstanceStatus::Available,
        BookInstanceStatus::Maintenance,
        BookInstanceStatus::Loaned,
        BookInstanceStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookInstanceStatus::Available => "Available",
            BookInstanceStatus::Maintenance => "Maintenance",
            BookInstanceStatus::Loaned => "Loaned",
            BookInstanceStatus::Reserved => "Reserved",
        }
    }
}

impl FromStr for BookInstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown status '{}'", s))
    }
}

impl std::fmt::Display for BookInstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored copy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookInstance {
    pub id: Uuid,
    /// Book id
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: NaiveDate,
}

impl Default for BookInstance {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            book: Uuid::nil(),
            imprint: String::new(),
            status: BookInstanceStatus::default(),
            due_back: Utc::now().date_naive(),
        }
    }
}

impl BookInstance {
    pub fn url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }

    /// Medium date, e.g. "Oct 19, 2026"
    pub fn due_back_formatted(&self) -> String {
        self.due_back.format("%b %-d, %Y").to_string()
    }
}

impl Document for BookInstance {
    const COLLECTION: &'static str = "book_instances";
    const LABEL: &'static str = "Book instance";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookInstanceView {
    pub id: Uuid,
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: NaiveDate,
    pub due_back_formatted: String,
    pub url: String,
}

impl From<&BookInstance> for BookInstanceView {
    fn from(instance: &BookInstance) -> Self {
        Self {
            id: instance.id,
            book: instance.book,
            imprint: instance.imprint.clone(),
            status: instance.status,
            due_back: instance.due_back,
            due_back_formatted: instance.due_back_formatted(),
            url: instance.url(),
        }
    }
}

/// Copy with its book resolved (`None` when the book is gone)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PopulatedBookInstance {
    pub instance: BookInstanceView,
    pub book: Option<BookView>,
}

/// Raw book instance form submission
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookInstanceForm {
    /// Book id
    pub book: Option<String>,
    pub imprint: Option<String>,
    /// One of Available, Maintenance, Loaned, Reserved; empty means Maintenance
    pub status: Option<String>,
    /// `YYYY-MM-DD`; empty means today
    pub due_back: Option<String>,
}
