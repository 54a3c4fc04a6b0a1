use askama::Template;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};
use migration::MigratorTrait;
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config;
use crate::item::{ItemServiceError, create_item_router};
use crate::list::{ListServiceError, create_list_router};
use crate::repo::{DatabaseRepository, Repository};
use crate::worker::{JobQueue, QueueError, WorkerConfig, spawn_list_completer};

pub mod api;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub jobs: JobQueue,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, jobs: JobQueue) -> Self {
        Self { repo, jobs }
    }
}

/// Custom error type for HTML handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents a missing list or item.
    #[error("{0}")]
    NotFound(String),
    /// Represents a failure of the underlying store.
    #[error("Storage error: {0}")]
    Storage(String),
    /// Represents a job queue that cannot accept work.
    #[error("Job queue error: {0}")]
    Queue(#[from] QueueError),
}

impl From<ListServiceError> for WebError {
    fn from(err: ListServiceError) -> Self {
        match err {
            ListServiceError::ListNotFound(_) => WebError::NotFound(err.to_string()),
            other => WebError::Storage(other.to_string()),
        }
    }
}

impl From<ItemServiceError> for WebError {
    fn from(err: ItemServiceError) -> Self {
        match err {
            ItemServiceError::ListNotFound(_) | ItemServiceError::ItemNotFound(_) => {
                WebError::NotFound(err.to_string())
            }
            other => WebError::Storage(other.to_string()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, title, user_facing_error_message) = match &self {
            WebError::NotFound(message) => (StatusCode::NOT_FOUND, "Not Found", message.clone()),
            WebError::Queue(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service Unavailable",
                "The tasks could not be scheduled right now. Please try again later.".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "An unexpected error occurred while processing your request. Please try again later."
                    .to_string(),
            ),
        };
        if status_code.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let template = ErrorTemplate::new(title, user_facing_error_message);
        match template.render() {
            Ok(rendered) => (status_code, Html(rendered)).into_response(),
            Err(_) => status_code.into_response(),
        }
    }
}

/// Query string carrying a flash notice across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    /// Maps the notice key to its message. Unknown keys show nothing.
    pub fn message(&self) -> Option<&'static str> {
        match self.notice.as_deref()? {
            "list_deleted" => Some("Todo list was successfully destroyed."),
            "tasks_enqueued" => Some("Tasks are being completed in the background."),
            "item_deleted" => Some("Task was successfully destroyed."),
            "item_completed" => Some("Task was successfully completed."),
            _ => None,
        }
    }
}

pub fn notice_redirect(path: &str, notice: &str) -> Redirect {
    Redirect::to(&format!("{path}?notice={notice}"))
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    title: &'static str,
    message: String,
}

impl ErrorTemplate {
    pub fn new(title: &'static str, message: String) -> Self {
        Self { title, message }
    }
}

/// Builds the full application router: HTML pages, JSON API and health check.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/health", axum::routing::get(health_check_handler))
        .merge(create_list_router(state.clone()))
        .merge(create_item_router(state.clone()))
        .merge(api::create_api_router(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let repo: Arc<dyn Repository> = Arc::new(DatabaseRepository::new(Arc::new(db)));
    let (jobs, _worker) = spawn_list_completer(repo.clone(), WorkerConfig::from(&config));

    let state = Arc::new(AppState::new(repo, jobs));
    let app = create_app(state);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[tracing::instrument]
pub async fn root_handler() -> Redirect {
    Redirect::to("/todolists")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn can_handle_template_error_with_internal_server_error() {
        // Simulate a template rendering error using askama::Error::Custom
        let custom_error_message = "Simulated template rendering failure".to_string();
        let template_error = askama::Error::Custom(custom_error_message.into());

        let web_error = WebError::Template(template_error);
        let response = axum::response::IntoResponse::into_response(web_error);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_text = std::str::from_utf8(&body).unwrap();

        assert!(body_text.contains("<h1>Internal Server Error</h1>"));
        assert!(body_text.contains("An unexpected error occurred"));
    }

    #[tokio::test]
    async fn can_render_not_found_page() {
        let web_error = WebError::from(ListServiceError::ListNotFound(9));
        let response = web_error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_text = std::str::from_utf8(&body).unwrap();

        assert!(body_text.contains("Todo list with ID 9 not found"));
    }

    #[test]
    fn maps_known_notice_keys_only() {
        let known = NoticeQuery {
            notice: Some("list_deleted".to_string()),
        };
        let unknown = NoticeQuery {
            notice: Some("<script>".to_string()),
        };

        assert_eq!(known.message(), Some("Todo list was successfully destroyed."));
        assert_eq!(unknown.message(), None);
        assert_eq!(NoticeQuery::default().message(), None);
    }

    #[tokio::test]
    async fn queue_error_renders_service_unavailable() {
        let response = WebError::from(QueueError::Full).into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
