//! Students repository for database operations

use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::{
    error::{map_unique_violation, AppError, AppResult},
    models::student::{CreateStudent, Student, StudentQuery},
};

use super::like_pattern;

const DUPLICATE_STUDENT: &str = "A student with this roll number or email already exists";

#[derive(Clone)]
pub struct StudentsRepository {
    pool: Pool<Sqlite>,
}

impl StudentsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get student by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Student> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
    }

    /// Search students by name, roll number or department, in storage order
    pub async fn search(&self, query: &StudentQuery) -> AppResult<Vec<Student>> {
        let pattern = like_pattern(query.q.as_deref());
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT * FROM students
            WHERE ?1 IS NULL
               OR LOWER(name) LIKE ?1 ESCAPE '\'
               OR LOWER(roll_no) LIKE ?1 ESCAPE '\'
               OR LOWER(department) LIKE ?1 ESCAPE '\'
            ORDER BY id
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    /// Check if a roll number is already taken
    pub async fn roll_no_exists(&self, roll_no: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM students WHERE roll_no = ?1 AND (?2 IS NULL OR id != ?2))",
        )
        .bind(roll_no)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Check if an email is already taken (case-insensitive)
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM students WHERE LOWER(email) = LOWER(?1) AND (?2 IS NULL OR id != ?2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new student. UNIQUE violations surface as `Conflict`.
    pub async fn create(&self, student: &CreateStudent) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (name, roll_no, department, email, phone)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(&student.name)
        .bind(&student.roll_no)
        .bind(&student.department)
        .bind(&student.email)
        .bind(&student.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_STUDENT))
    }

    /// Overwrite every editable column of an existing student
    pub async fn update(&self, student: &Student) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET name = ?1, roll_no = ?2, department = ?3, email = ?4, phone = ?5
            WHERE id = ?6
            RETURNING *
            "#,
        )
        .bind(&student.name)
        .bind(&student.roll_no)
        .bind(&student.department)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(student.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_STUDENT))?
        .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", student.id)))
    }

    /// Count all students
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Whether a student row exists
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(exists)
    }

    /// Delete a student row only when no issue references it. Returns `false`
    /// when the student is missing or still referenced.
    pub async fn delete_unreferenced(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM students
            WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM issues WHERE student_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a student row
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Student with id {} not found", id)));
        }
        Ok(())
    }
}
