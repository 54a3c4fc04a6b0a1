use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::list::{ListId, ListService, TodoList};
use crate::validation::ValidationErrors;
use crate::web::AppState;
use crate::web::api::{ApiError, ErrorResponse};

/// JSON representation of a TodoList for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListJson {
    /// Unique identifier for the list
    id: ListId,
    /// Name of the list
    name: String,
}

impl From<TodoList> for ListJson {
    fn from(list: TodoList) -> Self {
        Self {
            id: list.id(),
            name: list.name().to_string(),
        }
    }
}

/// API response for listing all lists.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListsResponse {
    todo_lists: Vec<ListJson>,
    /// Total number of lists
    count: usize,
}

/// Request body for creating a list. A missing name is treated as blank.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListRequest {
    #[serde(default)]
    name: String,
}

/// Request body for renaming a list. A missing name leaves the list unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateListRequest {
    #[serde(default)]
    name: Option<String>,
}

/// Handler for GET /api/todolists - Returns all lists in JSON format.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/todolists",
    responses(
        (status = 200, description = "Successfully retrieved lists", body = ListsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todo lists"
)]
pub async fn get_lists_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListsResponse>, ApiError> {
    let lists = ListService::new(state.repo.as_ref()).get_all_lists().await?;
    let todo_lists: Vec<ListJson> = lists.into_iter().map(ListJson::from).collect();
    let count = todo_lists.len();
    Ok(Json(ListsResponse { todo_lists, count }))
}

/// Handler for POST /api/todolists.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/todolists",
    request_body = CreateListRequest,
    responses(
        (status = 201, description = "List created", body = ListJson),
        (status = 422, description = "Invalid attributes", body = ValidationErrors),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todo lists"
)]
pub async fn create_list_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ListJson>), ApiError> {
    let list = ListService::new(state.repo.as_ref())
        .create_list(request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ListJson::from(list))))
}

/// Handler for PUT /api/todolists/{list_id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/todolists/{list_id}",
    params(("list_id" = i32, Path, description = "ID of the list")),
    request_body = UpdateListRequest,
    responses(
        (status = 200, description = "List renamed", body = ListJson),
        (status = 404, description = "List not found", body = ErrorResponse),
        (status = 422, description = "Invalid attributes", body = ValidationErrors)
    ),
    tag = "Todo lists"
)]
pub async fn update_list_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
    Json(request): Json<UpdateListRequest>,
) -> Result<Json<ListJson>, ApiError> {
    let list_service = ListService::new(state.repo.as_ref());
    let list = match request.name {
        Some(name) => list_service.update_list(list_id, name).await?,
        None => list_service.get_list(list_id).await?,
    };
    Ok(Json(ListJson::from(list)))
}

/// Handler for DELETE /api/todolists/{list_id}. Responds with an empty body.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/todolists/{list_id}",
    params(("list_id" = i32, Path, description = "ID of the list")),
    responses(
        (status = 200, description = "List and its items deleted"),
        (status = 404, description = "List not found", body = ErrorResponse)
    ),
    tag = "Todo lists"
)]
pub async fn delete_list_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
) -> Result<StatusCode, ApiError> {
    ListService::new(state.repo.as_ref())
        .delete_list(list_id)
        .await?;
    Ok(StatusCode::OK)
}

/// Handler for PUT /api/todolists/{list_id}/complete_tasks.
///
/// Enqueues completion of every pending item and returns before any item is touched.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/todolists/{list_id}/complete_tasks",
    params(("list_id" = i32, Path, description = "ID of the list")),
    responses(
        (status = 200, description = "Completion scheduled"),
        (status = 503, description = "Job queue unavailable", body = ErrorResponse)
    ),
    tag = "Todo lists"
)]
pub async fn complete_tasks_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
) -> Result<StatusCode, ApiError> {
    state.jobs.enqueue_complete_list(list_id)?;
    Ok(StatusCode::OK)
}

/// Creates and returns the lists API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/todolists",
            get(get_lists_handler).post(create_list_handler),
        )
        .route(
            "/todolists/{list_id}",
            put(update_list_handler).delete(delete_list_handler),
        )
        .route(
            "/todolists/{list_id}/complete_tasks",
            put(complete_tasks_handler),
        )
        .with_state(state)
}
