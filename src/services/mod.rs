//! Business logic services

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod inventory;
pub mod students;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub students: students::StudentsService,
    pub inventory: inventory::InventoryService,
    pub dashboard: dashboard::DashboardService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), config.library.clone()),
            students: students::StudentsService::new(repository.clone(), config.library.clone()),
            inventory: inventory::InventoryService::new(repository.clone(), config.library.clone()),
            dashboard: dashboard::DashboardService::new(repository.clone()),
            repository,
        }
    }

    /// Whether the database answers
    pub async fn is_ready(&self) -> bool {
        self.repository.ping().await.is_ok()
    }
}
