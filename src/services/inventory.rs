//! Inventory controller: issuing and returning books
//!
//! This is the only code that changes a book's quantity or closes an issue.
//! Both operations run in one transaction, and the stock check is folded into
//! the decrement statement, so concurrent requests for the last copy cannot
//! both succeed.

use chrono::{NaiveDate, Utc};

use crate::{
    config::LibraryConfig,
    error::{AppError, AppResult},
    models::issue::{Issue, IssueDetails, IssueQuery},
    repository::{
        books::BooksRepository, issues::IssuesRepository, students::StudentsRepository, Repository,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
    config: LibraryConfig,
}

impl InventoryService {
    pub fn new(repository: Repository, config: LibraryConfig) -> Self {
        Self { repository, config }
    }

    /// Get an issue with student name and book title
    pub async fn get_issue(&self, id: i64) -> AppResult<IssueDetails> {
        self.repository.issues.get_details(id).await
    }

    /// Search issues by student name
    pub async fn search_issues(&self, query: &IssueQuery) -> AppResult<Vec<IssueDetails>> {
        self.repository.issues.search(query).await
    }

    /// Issue a book to a student, taking one copy off the shelf
    pub async fn issue(&self, student_id: i64, book_id: i64) -> AppResult<Issue> {
        let mut tx = self.repository.pool.begin().await?;

        // Write first so the transaction holds the database write lock from here on
        if !BooksRepository::take_copy(&mut tx, book_id).await? {
            if !StudentsRepository::exists(&mut tx, student_id).await? {
                return Err(student_not_found(student_id));
            }
            if !BooksRepository::exists(&mut tx, book_id).await? {
                return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
            }
            tracing::warn!(book_id, student_id, "Issue refused: no copy left");
            return Err(AppError::OutOfStock(format!(
                "Book with id {} is not available",
                book_id
            )));
        }

        // Returning early drops `tx`, which rolls the decrement back
        if !StudentsRepository::exists(&mut tx, student_id).await? {
            return Err(student_not_found(student_id));
        }

        if !self.config.allow_duplicate_loans
            && IssuesRepository::has_open_loan(&mut tx, student_id, book_id).await?
        {
            return Err(AppError::BusinessRule(format!(
                "Student {} already holds a copy of book {}",
                student_id, book_id
            )));
        }

        if let Some(max) = self.config.max_open_loans_per_student {
            let open = IssuesRepository::count_open_for_student(&mut tx, student_id).await?;
            if open >= i64::from(max) {
                return Err(AppError::BusinessRule(format!(
                    "Maximum open loans reached ({}/{})",
                    open, max
                )));
            }
        }

        let issue = IssuesRepository::insert(&mut tx, student_id, book_id, today()).await?;
        tx.commit().await?;

        tracing::info!(issue_id = issue.id, book_id, student_id, "Book issued");
        Ok(issue)
    }

    /// Close an issue and put its copy back on the shelf.
    ///
    /// Returning an already-returned issue changes nothing and yields the
    /// issue as stored.
    pub async fn return_book(&self, issue_id: i64) -> AppResult<Issue> {
        let mut tx = self.repository.pool.begin().await?;

        let closed = IssuesRepository::close(&mut tx, issue_id, today()).await?;
        let issue = IssuesRepository::find(&mut tx, issue_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue with id {} not found", issue_id)))?;

        if !closed {
            tracing::debug!(issue_id, "Return ignored: issue already closed");
            return Ok(issue);
        }

        BooksRepository::restore_copy(&mut tx, issue.book_id).await?;
        tx.commit().await?;

        tracing::info!(issue_id, book_id = issue.book_id, "Book returned");
        Ok(issue)
    }
}

fn student_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Student with id {} not found", id))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
