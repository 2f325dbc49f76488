//! Catalog management service

use validator::Validate;

use crate::{
    config::{DeletePolicy, LibraryConfig},
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::{books::BooksRepository, issues::IssuesRepository, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: LibraryConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: LibraryConfig) -> Self {
        Self { repository, config }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, quantity = created.quantity, "Book created");
        Ok(created)
    }

    /// Edit a book. A quantity change here is a manual stock correction.
    pub async fn update_book(&self, id: i64, update: UpdateBook) -> AppResult<Book> {
        update.validate()?;
        let updated = self.repository.books.update(id, &update).await?;

        if let Some(quantity) = update.quantity {
            tracing::info!(book_id = id, quantity, "Book stock corrected");
        }
        Ok(updated)
    }

    /// Delete a book, applying the configured policy to its issue records.
    ///
    /// Every branch writes before it reads, so the transaction holds the write
    /// lock from its first statement.
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let removed = match self.config.delete_policy {
            DeletePolicy::Restrict => {
                if !BooksRepository::delete_unreferenced(&mut tx, id).await? {
                    if !BooksRepository::exists(&mut tx, id).await? {
                        return Err(book_not_found(id));
                    }
                    let references = IssuesRepository::count_for_book(&mut tx, id).await?;
                    return Err(AppError::BusinessRule(format!(
                        "Book {} has {} issue record(s) and cannot be deleted",
                        id, references
                    )));
                }
                0
            }
            DeletePolicy::Cascade => {
                let removed = IssuesRepository::delete_for_book(&mut tx, id).await?;
                BooksRepository::delete(&mut tx, id).await?;
                removed
            }
        };

        tx.commit().await?;

        tracing::info!(book_id = id, issues_removed = removed, "Book deleted");
        Ok(())
    }
}

fn book_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}
