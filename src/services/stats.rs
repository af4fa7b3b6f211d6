//! Catalog summary for the home page

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::BookInstanceStatus,
    repository::{Filter, Repository},
    services::aggregate::fetch_settled,
};

pub const SUMMARY_TITLE: &str = "Local Library Home";

/// Record counts; a count whose query failed is left out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub book_count: Option<u64>,
    pub book_instance_count: Option<u64>,
    pub book_instance_available_count: Option<u64>,
    pub author_count: Option<u64>,
    pub genre_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogSummary {
    pub title: String,
    pub data: CatalogCounts,
    /// Set when at least one count failed
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Cheapest round-trip to the store, used by the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.genres.count(&Filter::All).await.map(|_| ())
    }

    /// Count every collection concurrently.
    ///
    /// A failing count does not fail the summary: the other counts are still
    /// reported together with the first error.
    pub async fn summary(&self) -> CatalogSummary {
        let all = Filter::All;
        let available = Filter::eq("status", BookInstanceStatus::Available);

        let settled = fetch_settled([
            ("book_count", self.repository.books.count(&all)),
            ("book_instance_count", self.repository.book_instances.count(&all)),
            (
                "book_instance_available_count",
                self.repository.book_instances.count(&available),
            ),
            ("author_count", self.repository.authors.count(&all)),
            ("genre_count", self.repository.genres.count(&all)),
        ])
        .await;

        if let Some(e) = &settled.error {
            tracing::warn!("Catalog summary incomplete: {}", e);
        }

        let count = |name: &str| settled.values.get(name).copied();
        let data = CatalogCounts {
            book_count: count("book_count"),
            book_instance_count: count("book_instance_count"),
            book_instance_available_count: count("book_instance_available_count"),
            author_count: count("author_count"),
            genre_count: count("genre_count"),
        };

        CatalogSummary {
            title: SUMMARY_TITLE.to_string(),
            data,
            error: settled.error.as_ref().map(|e| e.to_string()),
        }
    }
}
