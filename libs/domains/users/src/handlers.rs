use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{
    AppError, IdPath, JsonBody,
    errors::responses::{BadRequestPathResponse, InternalServerErrorResponse},
};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserError;
use crate::models::{CreateUserOutcome, User};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(list_users, stream_users, get_user, create_user, delete_user),
    components(
        schemas(User),
        responses(BadRequestPathResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Users", description = "User management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/stream", get(stream_users))
        .route("/{id}", get(get_user).delete(delete_user))
        .with_state(shared_service)
}

impl IntoResponse for CreateUserOutcome {
    fn into_response(self) -> Response {
        match self {
            CreateUserOutcome::Created(user) => (StatusCode::OK, Json(user)).into_response(),
            CreateUserOutcome::Conflict => StatusCode::CONFLICT.into_response(),
            CreateUserOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// List all users
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    responses(
        (status = 200, description = "All users in store order", body = Vec<User>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository + 'static>(
    State(service): State<Arc<UserService<R>>>,
) -> Result<Json<Vec<User>>, AppError> {
    let users: Vec<User> = service.list().try_collect().await?;
    Ok(Json(users))
}

/// Stream all users as newline-delimited JSON
///
/// A store failure mid-stream aborts the response body.
#[utoipa::path(
    get,
    path = "/stream",
    tag = "Users",
    responses(
        (status = 200, description = "One JSON user per line", body = Vec<User>, content_type = "application/x-ndjson")
    )
)]
async fn stream_users<R: UserRepository + 'static>(
    State(service): State<Arc<UserService<R>>>,
) -> impl IntoResponse {
    let lines = service.stream_users().map(|result| {
        let user = result?;
        let mut line = serde_json::to_vec(&user)?;
        line.push(b'\n');
        Ok::<_, UserError>(Bytes::from(line))
    });

    (
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(lines),
    )
}

/// Get a user by ID
///
/// An unknown id is answered with 200 and an empty body.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "The user, or an empty body if it does not exist", body = User),
        (status = 400, response = BadRequestPathResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R: UserRepository + 'static>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    let response = match service.get_by_id(id).await? {
        Some(user) => Json(user).into_response(),
        None => StatusCode::OK.into_response(),
    };
    Ok(response)
}

/// Create a new user
///
/// Conflicts and failures carry no body.
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = User,
    responses(
        (status = 200, description = "User created", body = User),
        (status = 409, description = "Email already in use"),
        (status = 500, description = "User could not be created")
    )
)]
async fn create_user<R: UserRepository + 'static>(
    State(service): State<Arc<UserService<R>>>,
    JsonBody(user): JsonBody<User>,
) -> CreateUserOutcome {
    service.create(user).await
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted, or did not exist"),
        (status = 400, response = BadRequestPathResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository + 'static>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
