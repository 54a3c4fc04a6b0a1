use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::item::{Item, ItemChanges, ItemId, ItemService};
use crate::list::ListId;
use crate::validation::ValidationErrors;
use crate::web::AppState;
use crate::web::api::{ApiError, ErrorResponse};

/// JSON representation of an Item for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemJson {
    /// Unique identifier for the item
    id: ItemId,
    /// What needs to be done
    description: String,
    /// When the item was completed; null while pending
    completed_at: Option<DateTime<Utc>>,
    /// ID of the owning list
    todo_list_id: ListId,
}

impl From<Item> for ItemJson {
    fn from(item: Item) -> Self {
        Self {
            id: item.id(),
            description: item.description().to_string(),
            completed_at: item.completed_at(),
            todo_list_id: item.todo_list_id(),
        }
    }
}

/// API response for listing the items of a list.
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemsResponse {
    todos: Vec<ItemJson>,
    /// Total number of items
    count: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    #[serde(default)]
    description: String,
    /// Creates the item already completed when present
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

/// Only the description can be changed; completion goes through `complete_task`.
/// A missing description leaves the item unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    #[serde(default)]
    description: Option<String>,
}

/// Handler for GET /api/todolists/{list_id}/todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/todolists/{list_id}/todos",
    params(("list_id" = i32, Path, description = "ID of the list")),
    responses(
        (status = 200, description = "Successfully retrieved items", body = ItemsResponse),
        (status = 404, description = "List not found", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_items_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let items = ItemService::new(state.repo.as_ref())
        .get_items(list_id)
        .await?;
    let todos: Vec<ItemJson> = items.into_iter().map(ItemJson::from).collect();
    let count = todos.len();
    Ok(Json(ItemsResponse { todos, count }))
}

/// Handler for POST /api/todolists/{list_id}/todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/todolists/{list_id}/todos",
    params(("list_id" = i32, Path, description = "ID of the list")),
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemJson),
        (status = 404, description = "List not found", body = ErrorResponse),
        (status = 422, description = "Invalid attributes", body = ValidationErrors)
    ),
    tag = "Todos"
)]
pub async fn create_item_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemJson>), ApiError> {
    let item = ItemService::new(state.repo.as_ref())
        .create_item(list_id, request.description, request.completed_at)
        .await?;
    Ok((StatusCode::CREATED, Json(ItemJson::from(item))))
}

/// Handler for PUT /api/todolists/{list_id}/todos/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/todolists/{list_id}/todos/{id}",
    params(
        ("list_id" = i32, Path, description = "ID of the list"),
        ("id" = i32, Path, description = "ID of the item")
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ItemJson),
        (status = 404, description = "List or item not found", body = ErrorResponse),
        (status = 422, description = "Invalid attributes", body = ValidationErrors)
    ),
    tag = "Todos"
)]
pub async fn update_item_handler(
    State(state): State<Arc<AppState>>,
    Path((list_id, id)): Path<(ListId, ItemId)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<ItemJson>, ApiError> {
    let item = ItemService::new(state.repo.as_ref())
        .update_item(
            list_id,
            id,
            ItemChanges {
                description: request.description,
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(ItemJson::from(item)))
}

/// Handler for DELETE /api/todolists/{list_id}/todos/{id}. Responds with an empty body.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/todolists/{list_id}/todos/{id}",
    params(
        ("list_id" = i32, Path, description = "ID of the list"),
        ("id" = i32, Path, description = "ID of the item")
    ),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 404, description = "List or item not found", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Path((list_id, id)): Path<(ListId, ItemId)>,
) -> Result<StatusCode, ApiError> {
    ItemService::new(state.repo.as_ref())
        .delete_item(list_id, id)
        .await?;
    Ok(StatusCode::OK)
}

/// Handler for PUT /api/todolists/{list_id}/todos/{id}/complete_task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/todolists/{list_id}/todos/{id}/complete_task",
    params(
        ("list_id" = i32, Path, description = "ID of the list"),
        ("id" = i32, Path, description = "ID of the item")
    ),
    responses(
        (status = 200, description = "Item completed", body = ItemJson),
        (status = 404, description = "List or item not found", body = ErrorResponse),
        (status = 422, description = "Item already completed", body = ValidationErrors)
    ),
    tag = "Todos"
)]
pub async fn complete_item_handler(
    State(state): State<Arc<AppState>>,
    Path((list_id, id)): Path<(ListId, ItemId)>,
) -> Result<Json<ItemJson>, ApiError> {
    let item = ItemService::new(state.repo.as_ref())
        .complete_item(list_id, id)
        .await?;
    Ok(Json(ItemJson::from(item)))
}

/// Creates and returns the items API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/todolists/{list_id}/todos",
            get(get_items_handler).post(create_item_handler),
        )
        .route(
            "/todolists/{list_id}/todos/{id}",
            put(update_item_handler).delete(delete_item_handler),
        )
        .route(
            "/todolists/{list_id}/todos/{id}/complete_task",
            put(complete_item_handler),
        )
        .with_state(state)
}
