//! Issue (loan) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::issue::{CreateIssue, Issue, IssueDetails, IssueQuery},
};

use super::AuthenticatedAdmin;

/// Result of an issue or return action
#[derive(Serialize, ToSchema)]
pub struct IssueResponse {
    /// Status message
    pub message: String,
    pub issue: Issue,
}

/// List issues, optionally filtered by student name
#[utoipa::path(
    get,
    path = "/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(IssueQuery),
    responses(
        (status = 200, description = "Matching issues in storage order", body = Vec<IssueDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_issues(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Query(query): Query<IssueQuery>,
) -> AppResult<Json<Vec<IssueDetails>>> {
    let issues = state.services.inventory.search_issues(&query).await?;
    Ok(Json(issues))
}

/// Get issue details by ID
#[utoipa::path(
    get,
    path = "/issues/{id}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Issue ID")
    ),
    responses(
        (status = 200, description = "Issue details", body = IssueDetails),
        (status = 404, description = "Issue not found")
    )
)]
pub async fn get_issue(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i64>,
) -> AppResult<Json<IssueDetails>> {
    let issue = state.services.inventory.get_issue(id).await?;
    Ok(Json(issue))
}

/// Issue a book to a student
#[utoipa::path(
    post,
    path = "/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    request_body = CreateIssue,
    responses(
        (status = 201, description = "Book issued", body = IssueResponse),
        (status = 404, description = "Student or book not found"),
        (status = 409, description = "No copy left"),
        (status = 422, description = "Loan policy refused the issue")
    )
)]
pub async fn issue_book(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Json(request): Json<CreateIssue>,
) -> AppResult<(StatusCode, Json<IssueResponse>)> {
    let issue = state
        .services
        .inventory
        .issue(request.student_id, request.book_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            message: "Book issued successfully".to_string(),
            issue,
        }),
    ))
}

/// Return an issued book. Returning twice is harmless.
#[utoipa::path(
    post,
    path = "/issues/{id}/return",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Issue ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = IssueResponse),
        (status = 404, description = "Issue not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i64>,
) -> AppResult<Json<IssueResponse>> {
    let issue = state.services.inventory.return_book(id).await?;

    Ok(Json(IssueResponse {
        message: "Book returned".to_string(),
        issue,
    }))
}
