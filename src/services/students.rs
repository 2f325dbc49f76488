//! Student roster service

use validator::Validate;

use crate::{
    config::{DeletePolicy, LibraryConfig},
    error::{AppError, AppResult},
    models::student::{CreateStudent, Student, StudentQuery, UpdateStudent},
    repository::{
        books::BooksRepository, issues::IssuesRepository, students::StudentsRepository, Repository,
    },
};

#[derive(Clone)]
pub struct StudentsService {
    repository: Repository,
    config: LibraryConfig,
}

impl StudentsService {
    pub fn new(repository: Repository, config: LibraryConfig) -> Self {
        Self { repository, config }
    }

    /// Search students
    pub async fn search_students(&self, query: &StudentQuery) -> AppResult<Vec<Student>> {
        self.repository.students.search(query).await
    }

    /// Get student by ID
    pub async fn get_student(&self, id: i64) -> AppResult<Student> {
        self.repository.students.get_by_id(id).await
    }

    /// Register a student. All fields are required; roll number and email must be unique.
    pub async fn create_student(&self, student: CreateStudent) -> AppResult<Student> {
        student.validate()?;
        self.ensure_unique(&student.roll_no, &student.email, None).await?;

        let created = self.repository.students.create(&student).await?;
        tracing::info!(student_id = created.id, "Student created");
        Ok(created)
    }

    /// Edit a student, re-checking uniqueness against every other record
    pub async fn update_student(&self, id: i64, update: UpdateStudent) -> AppResult<Student> {
        update.validate()?;
        let current = self.repository.students.get_by_id(id).await?;
        let merged = update.apply_to(&current);
        self.ensure_unique(&merged.roll_no, &merged.email, Some(id)).await?;

        self.repository.students.update(&merged).await
    }

    /// Delete a student, applying the configured policy to their issue records.
    ///
    /// Under `Cascade`, copies the student still holds go back on the shelf
    /// before their issues are removed. Every branch writes before it reads.
    pub async fn delete_student(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let removed = match self.config.delete_policy {
            DeletePolicy::Restrict => {
                if !StudentsRepository::delete_unreferenced(&mut tx, id).await? {
                    if !StudentsRepository::exists(&mut tx, id).await? {
                        return Err(AppError::NotFound(format!("Student with id {} not found", id)));
                    }
                    let references = IssuesRepository::count_for_student(&mut tx, id).await?;
                    return Err(AppError::BusinessRule(format!(
                        "Student {} has {} issue record(s) and cannot be deleted",
                        id, references
                    )));
                }
                0
            }
            DeletePolicy::Cascade => {
                BooksRepository::restore_open_loans_of_student(&mut tx, id).await?;
                let removed = IssuesRepository::delete_for_student(&mut tx, id).await?;
                // A missing student rolls the whole transaction back
                StudentsRepository::delete(&mut tx, id).await?;
                removed
            }
        };

        tx.commit().await?;

        tracing::info!(student_id = id, issues_removed = removed, "Student deleted");
        Ok(())
    }

    async fn ensure_unique(
        &self,
        roll_no: &str,
        email: &str,
        exclude_id: Option<i64>,
    ) -> AppResult<()> {
        if self.repository.students.roll_no_exists(roll_no, exclude_id).await? {
            return Err(AppError::Conflict(format!(
                "Roll number '{}' is already registered",
                roll_no
            )));
        }
        if self.repository.students.email_exists(email, exclude_id).await? {
            return Err(AppError::Conflict(format!("Email '{}' is already registered", email)));
        }
        Ok(())
    }
}
