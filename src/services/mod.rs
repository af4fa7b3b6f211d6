//! Business logic services

pub mod aggregate;
pub mod catalog;
pub mod forms;
pub mod integrity;
pub mod stats;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub forms: forms::FormService,
    pub integrity: integrity::IntegrityGuard,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        let catalog = catalog::CatalogService::new(repository.clone());
        Self {
            forms: forms::FormService::new(repository.clone(), catalog.clone()),
            integrity: integrity::IntegrityGuard::new(repository.clone(), catalog.clone()),
            stats: stats::StatsService::new(repository),
            catalog,
        }
    }
}
