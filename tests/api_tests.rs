//! API integration tests against an in-memory database

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shelfmark_server::{
    api,
    config::{AppConfig, DatabaseConfig},
    repository::{self, Repository},
    AppState,
};

async fn app() -> Router {
    let mut config = AppConfig::default();
    config.database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        busy_timeout_ms: 1_000,
    };
    config.auth.jwt_secret = "integration-secret".to_string();
    config.auth.admin_username = Some("admin".to_string());
    config.auth.admin_password = Some("admin".to_string());

    let pool = repository::connect(&config.database)
        .await
        .expect("Failed to open database");
    repository::migrate(&pool).await.expect("Failed to migrate");

    let state = AppState::new(config, Repository::new(pool));
    state
        .services
        .auth
        .ensure_default_admin()
        .await
        .expect("Failed to seed admin");
    api::router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .expect("Failed to send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, value)
}

/// Helper to get a bearer token for the seeded admin
async fn get_auth_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("No token in response").to_string()
}

async fn create_book(app: &Router, token: &str, title: &str, quantity: i32) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(token),
        Some(json!({
            "title": title,
            "author": "Mary Shelley",
            "isbn": "9780486282114",
            "quantity": quantity
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("No book ID")
}

async fn create_student(
    app: &Router,
    token: &str,
    name: &str,
    roll_no: &str,
    department: &str,
) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/students",
        Some(token),
        Some(json!({
            "name": name,
            "roll_no": roll_no,
            "department": department,
            "email": format!("{}@uni.edu", roll_no.to_lowercase()),
            "phone": "555-0100"
        })),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_unauthorized_access() {
    let app = app().await;

    for uri in ["/dashboard", "/books", "/students", "/issues"] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "NotAuthorized");
    }

    let (status, _) = send(&app, Method::GET, "/books", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = app().await;
    let token = get_auth_token(&app).await;

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_issue_and_return_last_copy() {
    let app = app().await;
    let token = get_auth_token(&app).await;
    let today = chrono::Utc::now().date_naive().to_string();

    let book_id = create_book(&app, &token, "Frankenstein", 1).await;
    let (status, student) = create_student(&app, &token, "Victor Smith", "R-1", "Chemistry").await;
    assert_eq!(status, StatusCode::CREATED);
    let student_id = student["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/issues",
        Some(&token),
        Some(json!({ "student_id": student_id, "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["issue"]["returned"], false);
    assert_eq!(body["issue"]["return_date"], Value::Null);
    let issue_id = body["issue"]["id"].as_i64().unwrap();

    let book_uri = format!("/books/{}", book_id);
    let (_, book) = send(&app, Method::GET, &book_uri, Some(&token), None).await;
    assert_eq!(book["quantity"], 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/issues",
        Some(&token),
        Some(json!({ "student_id": student_id, "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ItemNotAvailable");

    let return_uri = format!("/issues/{}/return", issue_id);
    let (status, body) = send(&app, Method::POST, &return_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issue"]["returned"], true);
    assert_eq!(body["issue"]["return_date"], today.as_str());

    // a second return changes nothing
    let (status, again) = send(&app, Method::POST, &return_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["issue"], body["issue"]);

    let (_, book) = send(&app, Method::GET, &book_uri, Some(&token), None).await;
    assert_eq!(book["quantity"], 1);

    let (status, listed) = send(&app, Method::GET, "/issues?q=victor", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["book_title"], "Frankenstein");
}

#[tokio::test]
async fn test_issue_unknown_records() {
    let app = app().await;
    let token = get_auth_token(&app).await;
    let book_id = create_book(&app, &token, "Frankenstein", 1).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/issues",
        Some(&token),
        Some(json!({ "student_id": 404, "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchData");

    let (status, _) = send(&app, Method::POST, "/issues/77/return", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_student_validation_and_uniqueness() {
    let app = app().await;
    let token = get_auth_token(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/students",
        Some(&token),
        Some(json!({
            "name": "No Phone",
            "roll_no": "R-9",
            "department": "Maths",
            "email": "np@uni.edu"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, _) = create_student(&app, &token, "Ada", "R-1", "Maths").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = create_student(&app, &token, "Another Ada", "R-1", "Maths").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");
}

#[tokio::test]
async fn test_search_students() {
    let app = app().await;
    let token = get_auth_token(&app).await;

    create_student(&app, &token, "John Smith", "R-1", "Physics").await;
    create_student(&app, &token, "Ada Lovelace", "R-2", "Goldsmithing").await;
    create_student(&app, &token, "Alan Turing", "R-3", "Computing").await;

    let (status, body) = send(&app, Method::GET, "/students?q=SMITH", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["John Smith", "Ada Lovelace"]);

    let (_, all) = send(&app, Method::GET, "/students?q=", Some(&token), None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_book_crud_and_dashboard() {
    let app = app().await;
    let token = get_auth_token(&app).await;

    let kept = create_book(&app, &token, "Frankenstein", 2).await;
    let removed = create_book(&app, &token, "The Last Man", 1).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", kept),
        Some(&token),
        Some(json!({ "title": "Frankenstein; or, The Modern Prometheus" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 2);

    let book_uri = format!("/books/{}", removed);
    let (status, _) = send(&app, Method::DELETE, &book_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &book_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(&token),
        Some(json!({ "title": "Negative", "author": "X", "isbn": "1", "quantity": -3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, dashboard) = send(&app, Method::GET, "/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total_books"], 1);
    assert_eq!(dashboard["total_students"], 0);
    assert_eq!(dashboard["issued_books"], 0);
    assert_eq!(dashboard["returned_books"], 0);
}
