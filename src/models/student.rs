//! Student (roster) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Student record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: i64,
    pub name: String,
    /// Unique roll number
    pub roll_no: String,
    pub department: String,
    /// Unique email address
    pub email: String,
    pub phone: String,
}

/// Student list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StudentQuery {
    /// Case-insensitive search in name, roll number and department
    pub q: Option<String>,
}

/// Create student request. Every field is required; missing and empty
/// values are both reported as validation errors.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStudent {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required (max 100 characters)"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "Roll number is required (max 20 characters)"))]
    pub roll_no: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Department is required (max 50 characters)"))]
    pub department: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 15, message = "Phone is required (max 15 characters)"))]
    pub phone: String,
}

/// Update student request; absent fields keep their current value
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudent {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty (max 100 characters)"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Roll number cannot be empty (max 20 characters)"))]
    pub roll_no: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Department cannot be empty (max 50 characters)"))]
    pub department: Option<String>,
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 15, message = "Phone cannot be empty (max 15 characters)"))]
    pub phone: Option<String>,
}

impl UpdateStudent {
    /// Merge the requested changes over the stored record
    pub fn apply_to(&self, student: &Student) -> Student {
        Student {
            id: student.id,
            name: self.name.clone().unwrap_or_else(|| student.name.clone()),
            roll_no: self.roll_no.clone().unwrap_or_else(|| student.roll_no.clone()),
            department: self
                .department
                .clone()
                .unwrap_or_else(|| student.department.clone()),
            email: self.email.clone().unwrap_or_else(|| student.email.clone()),
            phone: self.phone.clone().unwrap_or_else(|| student.phone.clone()),
        }
    }
}
