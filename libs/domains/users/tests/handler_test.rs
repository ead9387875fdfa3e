//! Handler tests for Users domain
//!
//! These tests drive the users router directly with an in-memory store:
//! - Request deserialization (JSON → User)
//! - Response bodies (JSON array, NDJSON, empty bodies)
//! - HTTP status codes
//! - Error responses for malformed input

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::json;
use test_utils::TestDataBuilder;
use tower::ServiceExt; // For oneshot()

fn app() -> Router {
    handlers::router(UserService::new(InMemoryUserRepository::new()))
}

async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

fn post_user(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_create_user_returns_saved_user() {
    let app = app();

    let response = app
        .oneshot(post_user(json!({"name": "Ada", "email": "ada@x.io"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let user: User = json_body(response.into_body()).await;
    assert_eq!(user, User::new("Ada", "ada@x.io").with_id(1));
}

#[tokio::test]
async fn test_create_user_ignores_client_id() {
    let app = app();

    let response = app
        .oneshot(post_user(json!({"id": 99, "name": "Ada", "email": "ada@x.io"})))
        .await
        .unwrap();

    let user: User = json_body(response.into_body()).await;
    assert_eq!(user.id, Some(1));
}

#[tokio::test]
async fn test_create_duplicate_email_returns_409_with_empty_body() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("handler_duplicate_email");
    let email = builder.email("ada");

    let first = app
        .clone()
        .oneshot(post_user(json!({"name": "Ada", "email": email})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(post_user(json!({"name": "Other", "email": email})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert!(body_bytes(second.into_body()).await.is_empty());

    // Nothing extra was stored
    let list = app.oneshot(get("/")).await.unwrap();
    let users: Vec<User> = json_body(list.into_body()).await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Ada");
}

#[tokio::test]
async fn test_create_malformed_json_returns_400() {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": \"Ada\""))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "JSON_EXTRACTION");
}

#[tokio::test]
async fn test_list_users_returns_json_array_in_id_order() {
    let app = app();

    for (name, email) in [("Ada", "ada@x.io"), ("Alan", "alan@x.io")] {
        app.clone()
            .oneshot(post_user(json!({"name": name, "email": email})))
            .await
            .unwrap();
    }

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let users: Vec<User> = json_body(response.into_body()).await;
    assert_eq!(
        users,
        vec![
            User::new("Ada", "ada@x.io").with_id(1),
            User::new("Alan", "alan@x.io").with_id(2),
        ]
    );
}

#[tokio::test]
async fn test_list_users_empty_store() {
    let response = app().oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let users: Vec<User> = json_body(response.into_body()).await;
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_stream_users_returns_ndjson() {
    let app = app();

    for (name, email) in [("Ada", "ada@x.io"), ("Alan", "alan@x.io")] {
        app.clone()
            .oneshot(post_user(json!({"name": name, "email": email})))
            .await
            .unwrap();
    }

    let response = app.oneshot(get("/stream")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        handlers::NDJSON_CONTENT_TYPE
    );

    let body = String::from_utf8(body_bytes(response.into_body()).await).unwrap();
    let users: Vec<User> = body
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].email, "ada@x.io");
    assert_eq!(users[1].email, "alan@x.io");
}

#[tokio::test]
async fn test_get_user_by_id() {
    let app = app();
    app.clone()
        .oneshot(post_user(json!({"name": "Ada", "email": "ada@x.io"})))
        .await
        .unwrap();

    let response = app.oneshot(get("/1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let user: User = json_body(response.into_body()).await;
    assert_eq!(user, User::new("Ada", "ada@x.io").with_id(1));
}

#[tokio::test]
async fn test_get_missing_user_returns_200_with_empty_body() {
    let response = app().oneshot(get("/42")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response.into_body()).await.is_empty());
}

#[tokio::test]
async fn test_get_user_invalid_id_returns_400() {
    let response = app().oneshot(get("/abc")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_PATH_PARAMETER");
}

#[tokio::test]
async fn test_delete_user_returns_204_and_evicts() {
    let app = app();
    app.clone()
        .oneshot(post_user(json!({"name": "Ada", "email": "ada@x.io"})))
        .await
        .unwrap();

    // Warm both cache entries
    app.clone().oneshot(get("/1")).await.unwrap();
    app.clone().oneshot(get("/")).await.unwrap();

    let delete = Request::builder()
        .method("DELETE")
        .uri("/1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get("/1")).await.unwrap();
    assert!(body_bytes(response.into_body()).await.is_empty());

    let response = app.oneshot(get("/")).await.unwrap();
    let users: Vec<User> = json_body(response.into_body()).await;
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_delete_missing_user_returns_204() {
    let delete = Request::builder()
        .method("DELETE")
        .uri("/7")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(delete).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
