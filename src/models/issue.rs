//! Issue (book loan) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Issue record from database. `return_date` is set exactly when `returned` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Issue {
    pub id: i64,
    pub student_id: i64,
    pub book_id: i64,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub returned: bool,
}

/// Issue joined with the names shown in issue lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IssueDetails {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub book_id: i64,
    pub book_title: String,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub returned: bool,
}

/// Issue list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct IssueQuery {
    /// Case-insensitive search in the borrowing student's name
    pub q: Option<String>,
    /// Restrict to open (`false`) or closed (`true`) loans
    pub returned: Option<bool>,
}

/// Issue a book to a student
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIssue {
    pub student_id: i64,
    pub book_id: i64,
}
