//! Student (roster) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::student::{CreateStudent, Student, StudentQuery, UpdateStudent},
};

use super::AuthenticatedAdmin;

/// List students, optionally filtered by a search query
#[utoipa::path(
    get,
    path = "/students",
    tag = "students",
    security(("bearer_auth" = [])),
    params(StudentQuery),
    responses(
        (status = 200, description = "Matching students in storage order", body = Vec<Student>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_students(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Query(query): Query<StudentQuery>,
) -> AppResult<Json<Vec<Student>>> {
    let students = state.services.students.search_students(&query).await?;
    Ok(Json(students))
}

/// Get student details by ID
#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i64>,
) -> AppResult<Json<Student>> {
    let student = state.services.students.get_student(id).await?;
    Ok(Json(student))
}

/// Register a student
#[utoipa::path(
    post,
    path = "/students",
    tag = "students",
    security(("bearer_auth" = [])),
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "A required field is missing"),
        (status = 409, description = "Roll number or email already registered")
    )
)]
pub async fn create_student(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Json(student): Json<CreateStudent>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let created = state.services.students.create_student(student).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edit a student
#[utoipa::path(
    put,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Student ID")
    ),
    request_body = UpdateStudent,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Roll number or email already registered")
    )
)]
pub async fn update_student(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i64>,
    Json(update): Json<UpdateStudent>,
) -> AppResult<Json<Student>> {
    let updated = state.services.students.update_student(id, update).await?;
    Ok(Json(updated))
}

/// Delete a student
#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Student not found"),
        (status = 422, description = "Student has issue records and the delete policy is restrict")
    )
)]
pub async fn delete_student(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.students.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
