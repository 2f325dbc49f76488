//! Repository layer for database operations
//!
//! Methods taking `&self` run on the pool. Associated functions taking a
//! `&mut SqliteConnection` are the pieces services compose inside a
//! transaction.

pub mod admins;
pub mod books;
pub mod issues;
pub mod students;

use std::{str::FromStr, time::Duration};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::config::DatabaseConfig;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub books: books::BooksRepository,
    pub students: students::StudentsRepository,
    pub issues: issues::IssuesRepository,
    pub admins: admins::AdminsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            students: students::StudentsRepository::new(pool.clone()),
            issues: issues::IssuesRepository::new(pool.clone()),
            admins: admins::AdminsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open the SQLite pool described by `config`, creating the database file
/// (and its directory) when missing.
///
/// Every connection to an in-memory URL is a separate database, so such pools
/// are held to a single connection that never expires.
pub async fn connect(config: &DatabaseConfig) -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

    let in_memory = is_in_memory(&config.url);
    if !in_memory {
        let filename = options.clone().get_filename();
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let max_connections = if in_memory { 1 } else { config.max_connections.max(1) };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(config.min_connections.min(max_connections))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Apply the embedded schema migrations
pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Build a `LIKE` pattern matching `query` as a literal, lowercase substring.
/// Blank queries yield `None`, which the search statements treat as "match all".
///
/// Only ASCII letters are folded, the same as SQLite's `LOWER()` on the column
/// side. Other letters must match exactly.
pub(crate) fn like_pattern(query: Option<&str>) -> Option<String> {
    let query = query.map(str::trim).filter(|q| !q.is_empty())?;
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
pub(crate) async fn test_repository() -> Repository {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        busy_timeout_ms: 1_000,
    };
    let pool = connect(&config).await.expect("in-memory database");
    migrate(&pool).await.expect("migrations");
    Repository::new(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some("Smith")), Some("%smith%".to_string()));
        assert_eq!(like_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
        assert_eq!(like_pattern(Some("a\\b")), Some("%a\\\\b%".to_string()));
    }

    #[test]
    fn test_like_pattern_folds_ascii_only() {
        assert_eq!(like_pattern(Some("ÉCOLE")), Some("%École%".to_string()));
    }

    #[test]
    fn test_blank_query_matches_everything() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("")), None);
        assert_eq!(like_pattern(Some("   ")), None);
    }

    #[test]
    fn test_memory_urls_are_detected() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:test?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://data/shelfmark.db"));
    }
}
