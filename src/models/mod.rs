//! Data models for Shelfmark

pub mod admin;
pub mod book;
pub mod issue;
pub mod student;

// Re-export commonly used types
pub use admin::{Admin, AdminClaims};
pub use book::Book;
pub use issue::{Issue, IssueDetails};
pub use student::Student;
