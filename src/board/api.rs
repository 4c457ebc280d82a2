use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde::{Deserialize, Serialize};

use super::gateway::Gateway;
use super::models::{ClientFields, ColumnUpdate, NewNotification, NewTask};
use crate::errors::{BoardError, require_text};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AddColumnRequest {
    pub title: String,
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddTaskRequest {
    pub task: NewTask,
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveTaskRequest {
    pub column_id: i64,
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeQuery {
    pub older_than_days: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResult {
    pub deleted: usize,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::Validation(msg) => ApiError::BadRequest(msg),
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            BoardError::Persistence(e) => {
                tracing::error!(error = %format!("{:#}", e), "Store failure");
                ApiError::Internal(format!("{:#}", e))
            }
            e => ApiError::Internal(e.to_string()),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/users/{user}/board", get(get_board))
        .route("/api/boards/{id}/columns", post(add_column))
        .route(
            "/api/columns/{id}",
            patch(update_column).delete(delete_column),
        )
        .route("/api/columns/{id}/tasks", post(add_task))
        .route("/api/tasks/{id}", axum::routing::delete(delete_task))
        .route("/api/tasks/{id}/move", patch(move_task))
        .route("/api/users/{user}/clients", get(list_clients).post(add_client))
        .route("/api/clients/{id}", put(update_client).delete(delete_client))
        .route(
            "/api/users/{user}/notifications",
            get(list_notifications)
                .post(add_notification)
                .delete(purge_notifications),
        )
        .route("/api/notifications/{id}/read", post(mark_as_read))
        .route(
            "/api/users/{user}/notifications/read-all",
            post(mark_all_as_read),
        )
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_board(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let board = state.gateway.get_board(&user).await?;
    Ok(Json(board))
}

async fn add_column(
    State(state): State<SharedState>,
    Path(board_id): Path<i64>,
    Json(req): Json<AddColumnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = require_text("title", &req.title)?;
    let column = state
        .gateway
        .add_column(board_id, &title, req.position)
        .await?;
    Ok((StatusCode::CREATED, Json(column)))
}

async fn update_column(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(mut req): Json<ColumnUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(title) = &req.title {
        req.title = Some(require_text("title", title)?);
    }
    state.gateway.update_column(id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_column(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.gateway.delete_column(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_task(
    State(state): State<SharedState>,
    Path(column_id): Path<i64>,
    Json(mut req): Json<AddTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.task.title = require_text("title", &req.task.title)?;
    let task = state
        .gateway
        .add_task(column_id, req.task, req.position)
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.gateway.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn move_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .gateway
        .move_task(id, req.column_id, req.position)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_clients(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let clients = state.gateway.get_clients(&user).await?;
    Ok(Json(clients))
}

async fn add_client(
    State(state): State<SharedState>,
    Path(user): Path<String>,
    Json(mut fields): Json<ClientFields>,
) -> Result<impl IntoResponse, ApiError> {
    fields.name = require_text("name", &fields.name)?;
    let client = state.gateway.add_client(&user, fields).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn update_client(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(mut fields): Json<ClientFields>,
) -> Result<impl IntoResponse, ApiError> {
    fields.name = require_text("name", &fields.name)?;
    state.gateway.update_client(id, fields).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_client(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.gateway.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_notifications(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state.gateway.get_notifications(&user).await?;
    Ok(Json(notifications))
}

async fn add_notification(
    State(state): State<SharedState>,
    Path(user): Path<String>,
    Json(mut req): Json<NewNotification>,
) -> Result<impl IntoResponse, ApiError> {
    req.title = require_text("title", &req.title)?;
    let notification = state.gateway.add_notification(&user, req).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn mark_as_read(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.gateway.mark_as_read(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_all_as_read(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.gateway.mark_all_as_read(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn purge_notifications(
    State(state): State<SharedState>,
    Path(user): Path<String>,
    Query(query): Query<PurgeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .gateway
        .delete_older_than(&user, query.older_than_days)
        .await?;
    Ok(Json(PurgeResult { deleted }))
}

// ── Tests ─────────────────────────────────────────────────────────────
