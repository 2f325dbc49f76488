//! Issues (loan ledger) repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::{
    error::{AppError, AppResult},
    models::issue::{Issue, IssueDetails, IssueQuery},
};

use super::like_pattern;

const DETAILS_SELECT: &str = r#"
    SELECT i.id, i.student_id, s.name AS student_name,
           i.book_id, b.title AS book_title,
           i.issue_date, i.return_date, i.returned
    FROM issues i
    JOIN students s ON s.id = i.student_id
    JOIN books b ON b.id = i.book_id
"#;

#[derive(Clone)]
pub struct IssuesRepository {
    pool: Pool<Sqlite>,
}

impl IssuesRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get issue by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Issue> {
        sqlx::query_as::<_, Issue>("SELECT * FROM issues WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue with id {} not found", id)))
    }

    /// Get issue by ID with student name and book title
    pub async fn get_details(&self, id: i64) -> AppResult<IssueDetails> {
        sqlx::query_as::<_, IssueDetails>(&format!("{} WHERE i.id = ?1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue with id {} not found", id)))
    }

    /// Search issues by borrowing student's name, in storage order
    pub async fn search(&self, query: &IssueQuery) -> AppResult<Vec<IssueDetails>> {
        let pattern = like_pattern(query.q.as_deref());
        let sql = format!(
            r#"{}
            WHERE (?1 IS NULL OR LOWER(s.name) LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR i.returned = ?2)
            ORDER BY i.id
            "#,
            DETAILS_SELECT
        );

        let issues = sqlx::query_as::<_, IssueDetails>(&sql)
            .bind(pattern)
            .bind(query.returned)
            .fetch_all(&self.pool)
            .await?;

        Ok(issues)
    }

    /// Count issues that are still open (`returned = false`) or closed (`returned = true`)
    pub async fn count_by_status(&self, returned: bool) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM issues WHERE returned = ?1")
            .bind(returned)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Fetch an issue inside a transaction
    pub async fn find(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Issue>> {
        let issue = sqlx::query_as::<_, Issue>("SELECT * FROM issues WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(issue)
    }

    /// Open a loan
    pub async fn insert(
        conn: &mut SqliteConnection,
        student_id: i64,
        book_id: i64,
        issue_date: NaiveDate,
    ) -> AppResult<Issue> {
        let issue = sqlx::query_as::<_, Issue>(
            r#"
            INSERT INTO issues (student_id, book_id, issue_date, return_date, returned)
            VALUES (?1, ?2, ?3, NULL, 0)
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(book_id)
        .bind(issue_date)
        .fetch_one(&mut *conn)
        .await?;

        Ok(issue)
    }

    /// Close an open loan. Returns `false` when the issue is missing or already
    /// closed, in which case nothing is written.
    pub async fn close(
        conn: &mut SqliteConnection,
        id: i64,
        return_date: NaiveDate,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE issues SET returned = 1, return_date = ?1 WHERE id = ?2 AND returned = 0",
        )
        .bind(return_date)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Count the loans a student currently holds
    pub async fn count_open_for_student(
        conn: &mut SqliteConnection,
        student_id: i64,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM issues WHERE student_id = ?1 AND returned = 0",
        )
        .bind(student_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    /// Whether the student currently holds a copy of the book
    pub async fn has_open_loan(
        conn: &mut SqliteConnection,
        student_id: i64,
        book_id: i64,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM issues WHERE student_id = ?1 AND book_id = ?2 AND returned = 0)",
        )
        .bind(student_id)
        .bind(book_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Count every issue row (open or closed) referencing a student
    pub async fn count_for_student(conn: &mut SqliteConnection, student_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM issues WHERE student_id = ?1")
            .bind(student_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Count every issue row (open or closed) referencing a book
    pub async fn count_for_book(conn: &mut SqliteConnection, book_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM issues WHERE book_id = ?1")
            .bind(book_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Remove every issue row referencing a student
    pub async fn delete_for_student(
        conn: &mut SqliteConnection,
        student_id: i64,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM issues WHERE student_id = ?1")
            .bind(student_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove every issue row referencing a book
    pub async fn delete_for_book(conn: &mut SqliteConnection, book_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM issues WHERE book_id = ?1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
