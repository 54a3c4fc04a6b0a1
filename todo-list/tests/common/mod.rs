#![allow(dead_code)]

use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use todo_list_server::repo::{DatabaseRepository, InMemoryRepository, Repository};
use todo_list_server::web::{AppState, create_app};
use todo_list_server::worker::{ListCompleter, WorkerConfig};

/// Connects to a fresh in-memory SQLite database with all migrations applied.
pub async fn setup_db() -> anyhow::Result<DatabaseConnection> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let db = Database::connect("sqlite::memory:").await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn setup_db_repository() -> anyhow::Result<DatabaseRepository> {
    let db = setup_db().await?;
    Ok(DatabaseRepository::new(Arc::new(db)))
}

/// Test context for endpoint tests.
///
/// The completer is not spawned, so tests decide when queued jobs run.
pub struct TestContext {
    pub repo: Arc<InMemoryRepository>,
    pub completer: ListCompleter,
    pub app: axum::Router,
}

pub fn setup_app() -> TestContext {
    setup_app_with(WorkerConfig::default())
}

pub fn setup_app_with(config: WorkerConfig) -> TestContext {
    let _ = tracing_subscriber::fmt().try_init();
    let repo = Arc::new(InMemoryRepository::new());
    let shared: Arc<dyn Repository> = repo.clone();
    let (jobs, completer) = ListCompleter::new(shared.clone(), config);
    let app = create_app(Arc::new(AppState::new(shared, jobs)));
    TestContext {
        repo,
        completer,
        app,
    }
}

pub async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
