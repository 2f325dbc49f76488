//! Books repository for database operations

use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

use super::like_pattern;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books by title, author or ISBN, in storage order
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let pattern = like_pattern(query.q.as_deref());
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE (?1 IS NULL
                   OR LOWER(title) LIKE ?1 ESCAPE '\'
                   OR LOWER(author) LIKE ?1 ESCAPE '\'
                   OR LOWER(isbn) LIKE ?1 ESCAPE '\')
              AND (?2 = 0 OR quantity > 0)
            ORDER BY id
            "#,
        )
        .bind(pattern)
        .bind(query.available.unwrap_or(false))
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, quantity)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Apply a partial edit in one statement. Absent fields keep their stored
    /// value, so an edit that leaves quantity alone never rewrites it.
    pub async fn update(&self, id: i64, update: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE(?1, title),
                author = COALESCE(?2, author),
                isbn = COALESCE(?3, isbn),
                quantity = COALESCE(?4, quantity)
            WHERE id = ?5
            RETURNING *
            "#,
        )
        .bind(update.title.as_deref())
        .bind(update.author.as_deref())
        .bind(update.isbn.as_deref())
        .bind(update.quantity)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Whether a book row exists
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    /// Take one copy off the shelf. Returns `false` when the book is missing or
    /// has no copy left; the check and the decrement are a single statement.
    pub async fn take_copy(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE books SET quantity = quantity - 1 WHERE id = ?1 AND quantity > 0")
                .bind(id)
                .execute(&mut *conn)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Put one copy back on the shelf
    pub async fn restore_copy(conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET quantity = quantity + 1 WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Put back every copy a student still holds. Returns the number of books touched.
    pub async fn restore_open_loans_of_student(
        conn: &mut SqliteConnection,
        student_id: i64,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET quantity = quantity + (
                SELECT COUNT(*) FROM issues
                WHERE issues.book_id = books.id
                  AND issues.student_id = ?1
                  AND issues.returned = 0
            )
            WHERE id IN (
                SELECT book_id FROM issues WHERE student_id = ?1 AND returned = 0
            )
            "#,
        )
        .bind(student_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a book row only when no issue references it. Returns `false`
    /// when the book is missing or still referenced.
    pub async fn delete_unreferenced(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM books
            WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM issues WHERE book_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a book row
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_repository;

    fn book(title: &str, author: &str, isbn: &str, quantity: i32) -> CreateBook {
        CreateBook {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_search_matches_title_author_and_isbn() {
        let repo = test_repository().await;
        let books = &repo.books;
        books.create(&book("The Hobbit", "J.R.R. Tolkien", "9780547928227", 2)).await.unwrap();
        books.create(&book("Emma", "Jane Austen", "9780141439587", 1)).await.unwrap();
        books.create(&book("Persuasion", "Jane AUSTEN", "9780141439686", 0)).await.unwrap();

        let by_author = books
            .search(&BookQuery { q: Some("austen".into()), available: None })
            .await
            .unwrap();
        assert_eq!(
            by_author.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
            vec!["Emma", "Persuasion"]
        );

        let by_isbn = books
            .search(&BookQuery { q: Some("928227".into()), available: None })
            .await
            .unwrap();
        assert_eq!(by_isbn.len(), 1);
        assert_eq!(by_isbn[0].title, "The Hobbit");

        let all = books.search(&BookQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_available_filter_hides_empty_shelves() {
        let repo = test_repository().await;
        repo.books.create(&book("Emma", "Jane Austen", "1", 1)).await.unwrap();
        repo.books.create(&book("Persuasion", "Jane Austen", "2", 0)).await.unwrap();

        let available = repo
            .books
            .search(&BookQuery { q: None, available: Some(true) })
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].title, "Emma");
    }

    #[tokio::test]
    async fn test_wildcards_in_query_are_literal() {
        let repo = test_repository().await;
        repo.books.create(&book("100% Rust", "A", "1", 1)).await.unwrap();
        repo.books.create(&book("1000 Rust tips", "B", "2", 1)).await.unwrap();

        let found = repo
            .books
            .search(&BookQuery { q: Some("0%".into()), available: None })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "100% Rust");
    }

    #[tokio::test]
    async fn test_search_with_non_ascii_letters() {
        let repo = test_repository().await;
        repo.books.create(&book("École des femmes", "Molière", "1", 1)).await.unwrap();
        repo.books.create(&book("Tartuffe", "Molière", "2", 1)).await.unwrap();

        for q in ["École", "ÉCOLE des", "des FEMMES"] {
            let found = repo
                .books
                .search(&BookQuery { q: Some(q.into()), available: None })
                .await
                .unwrap();
            assert_eq!(found.len(), 1, "query {:?}", q);
            assert_eq!(found[0].title, "École des femmes");
        }

        let by_author = repo
            .books
            .search(&BookQuery { q: Some("molière".into()), available: None })
            .await
            .unwrap();
        assert_eq!(by_author.len(), 2);
    }

    #[tokio::test]
    async fn test_take_copy_stops_at_zero() {
        let repo = test_repository().await;
        let created = repo.books.create(&book("Emma", "Jane Austen", "1", 1)).await.unwrap();

        let mut conn = repo.pool.acquire().await.unwrap();
        assert!(BooksRepository::take_copy(&mut conn, created.id).await.unwrap());
        assert!(!BooksRepository::take_copy(&mut conn, created.id).await.unwrap());
        assert!(!BooksRepository::take_copy(&mut conn, created.id + 100).await.unwrap());
        drop(conn);

        assert_eq!(repo.books.get_by_id(created.id).await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_schema_rejects_negative_quantity() {
        let repo = test_repository().await;
        let created = repo.books.create(&book("Emma", "Jane Austen", "1", 0)).await.unwrap();

        let negative = UpdateBook {
            quantity: Some(-1),
            ..Default::default()
        };
        let result = repo.books.update(created.id, &negative).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
