//! Genre model

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::repository::Document;

/// Stored genre document. Names are unique by convention only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

impl Genre {
    pub fn url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }
}

impl Document for Genre {
    const COLLECTION: &'static str = "genres";
    const LABEL: &'static str = "Genre";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenreView {
    pub id: Uuid,
    pub name: String,
    pub url: String,
}

impl From<&Genre> for GenreView {
    fn from(genre: &Genre) -> Self {
        Self {
            id: genre.id,
            name: genre.name.clone(),
            url: genre.url(),
        }
    }
}

/// Raw genre form submission
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GenreForm {
    pub name: Option<String>,
}
