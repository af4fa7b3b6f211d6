//! Author model and related types

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::repository::Document;

/// Stored author document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "family_name, first_name", or empty when either part is missing
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", self.family_name, self.first_name)
    }

    pub fn lifespan(&self) -> String {
        match (self.date_of_birth, self.date_of_death) {
            (Some(born), Some(died)) => format!("{} - {}", born.year(), died.year()),
            (Some(born), None) => born.year().to_string(),
            _ => String::new(),
        }
    }

    pub fn url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }
}

impl Document for Author {
    const COLLECTION: &'static str = "authors";
    const LABEL: &'static str = "Author";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Author with its derived fields, as handed to views
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorView {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub name: String,
    pub lifespan: String,
    pub url: String,
}

impl From<&Author> for AuthorView {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
            name: author.display_name(),
            lifespan: author.lifespan(),
            url: author.url(),
        }
    }
}

/// Raw author form submission
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AuthorForm {
    pub first_name: Option<String>,
    pub family_name: Option<String>,
    /// `YYYY-MM-DD`; empty means unknown
    pub date_of_birth: Option<String>,
    pub date_of_death: Option<String>,
}
