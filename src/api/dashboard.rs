//! Dashboard endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedAdmin;

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub total_books: i64,
    pub total_students: i64,
    /// Issues not yet returned
    pub issued_books: i64,
    pub returned_books: i64,
}

/// Library totals
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Library totals", body = DashboardResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<Json<DashboardResponse>> {
    let dashboard = state.services.dashboard.get_dashboard().await?;
    Ok(Json(dashboard))
}
