use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::item::ItemServiceError;
use crate::item::api as item_api;
use crate::list::ListServiceError;
use crate::list::api as list_api;
use crate::validation::ValidationErrors;
use crate::web::AppState;
use crate::worker::QueueError;

/// Body of every non-validation error returned by the JSON API.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    error: String,
    /// Human-readable description
    message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
        }
    }
}

/// Error type for JSON handler operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("{0}")]
    Internal(String),
}

impl From<ListServiceError> for ApiError {
    fn from(err: ListServiceError) -> Self {
        match err {
            ListServiceError::Validation(errors) => ApiError::Validation(errors),
            ListServiceError::ListNotFound(_) => ApiError::NotFound(err.to_string()),
            ListServiceError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ItemServiceError> for ApiError {
    fn from(err: ItemServiceError) -> Self {
        match err {
            ItemServiceError::Validation(errors) => ApiError::Validation(errors),
            ItemServiceError::ListNotFound(_) | ItemServiceError::ItemNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ItemServiceError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("not_found", message)),
            )
                .into_response(),
            ApiError::Queue(err) => {
                tracing::warn!("Rejected job: {}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorResponse::new("service_unavailable", err.to_string())),
                )
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!("Request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(
                        "internal_server_error",
                        "An unexpected error occurred".to_string(),
                    )),
                )
                    .into_response()
            }
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_api::get_lists_handler,
        list_api::create_list_handler,
        list_api::update_list_handler,
        list_api::delete_list_handler,
        list_api::complete_tasks_handler,
        item_api::get_items_handler,
        item_api::create_item_handler,
        item_api::update_item_handler,
        item_api::delete_item_handler,
        item_api::complete_item_handler,
    ),
    components(schemas(ErrorResponse, ValidationErrors)),
    tags(
        (name = "Todo lists", description = "Managing todo lists"),
        (name = "Todos", description = "Managing the items of a todo list")
    )
)]
pub struct ApiDoc;

/// Handler for GET /api/openapi.json.
#[tracing::instrument]
async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Creates the API routes for JSON API endpoints, nested under `/api`.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/openapi.json", get(openapi_handler))
        .merge(list_api::create_api_router(state.clone()))
        .merge(item_api::create_api_router(state));
    Router::new().nest("/api", api_routes)
}
