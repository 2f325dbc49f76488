//! Dashboard counters

use crate::{api::dashboard::DashboardResponse, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
}

impl DashboardService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Totals shown on the landing page
    pub async fn get_dashboard(&self) -> AppResult<DashboardResponse> {
        Ok(DashboardResponse {
            total_books: self.repository.books.count().await?,
            total_students: self.repository.students.count().await?,
            issued_books: self.repository.issues.count_by_status(false).await?,
            returned_books: self.repository.issues.count_by_status(true).await?,
        })
    }
}
