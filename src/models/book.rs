//! Book (catalog) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// Copies currently on the shelf (not issued)
    pub quantity: i32,
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive search in title, author and ISBN
    pub q: Option<String>,
    /// Only books with at least one copy on the shelf
    pub available: Option<bool>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Author is required (max 100 characters)"))]
    pub author: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "ISBN is required (max 20 characters)"))]
    pub isbn: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
}

/// Update book request; absent fields keep their current value
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty (max 200 characters)"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Author cannot be empty (max 100 characters)"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 20, message = "ISBN cannot be empty (max 20 characters)"))]
    pub isbn: Option<String>,
    /// Stock correction; the issue/return flow never goes through here
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_quantity_is_rejected() {
        let create = CreateBook {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            isbn: "9780441013593".into(),
            quantity: -1,
        };
        assert!(create.validate().is_err());

        let update = UpdateBook {
            quantity: Some(-4),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
