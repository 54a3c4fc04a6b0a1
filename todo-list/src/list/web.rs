use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::item::{Item, ItemService};
use crate::list::{ListId, ListService, ListServiceError, ListSummary, TodoList};
use crate::web::{AppState, NoticeQuery, WebError, notice_redirect};

#[derive(Debug, Deserialize)]
pub struct ListForm {
    #[serde(default)]
    name: String,
}

#[derive(Template)]
#[template(path = "todo_lists/index.html")]
struct ListsTemplate {
    summaries: Vec<ListSummary>,
    notice: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "todo_lists/new.html")]
struct NewListTemplate {
    name: String,
    error_messages: Vec<String>,
    notice: Option<&'static str>,
}

impl NewListTemplate {
    pub fn new(name: String, error_messages: Vec<String>) -> Self {
        Self {
            name,
            error_messages,
            notice: None,
        }
    }
}

#[derive(Template)]
#[template(path = "todo_lists/edit.html")]
struct EditListTemplate {
    list: TodoList,
    name: String,
    error_messages: Vec<String>,
    notice: Option<&'static str>,
}

impl EditListTemplate {
    pub fn new(list: TodoList, name: String, error_messages: Vec<String>) -> Self {
        Self {
            list,
            name,
            error_messages,
            notice: None,
        }
    }
}

#[derive(Template)]
#[template(path = "todo_lists/show.html")]
struct ShowListTemplate {
    list: TodoList,
    items: Vec<Item>,
    pending: bool,
    notice: Option<&'static str>,
}

/// Renders the show page of a list with its items.
async fn render_list_page(state: &AppState, list: TodoList) -> Result<String, WebError> {
    let items = ItemService::new(state.repo.as_ref())
        .get_items(list.id())
        .await?;
    let pending = items.iter().any(Item::is_pending);
    let template = ShowListTemplate {
        list,
        items,
        pending,
        notice: None,
    };
    template.render().map_err(WebError::from)
}

/// Handler for GET /todolists that displays all lists with their status.
#[tracing::instrument(skip(state))]
async fn lists_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, WebError> {
    let summaries = ListService::new(state.repo.as_ref())
        .get_list_summaries()
        .await?;
    let template = ListsTemplate {
        summaries,
        notice: query.message(),
    };
    template.render().map(Html).map_err(WebError::from)
}

/// Handler for serving the new list form.
#[tracing::instrument]
async fn new_list_handler() -> Result<Html<String>, WebError> {
    let template = NewListTemplate::new(String::new(), Vec::new());
    template.render().map(Html).map_err(WebError::from)
}

/// Handler for creating a new list via POST request.
#[tracing::instrument(skip(state))]
async fn create_list_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ListForm>,
) -> Result<Response, WebError> {
    let list_service = ListService::new(state.repo.as_ref());

    match list_service.create_list(form.name.clone()).await {
        Ok(list) => {
            let page = render_list_page(&state, list).await?;
            Ok((StatusCode::CREATED, Html(page)).into_response())
        }
        Err(ListServiceError::Validation(errors)) => {
            let template = NewListTemplate::new(form.name, errors.full_messages());
            let page = template.render()?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(WebError::from(err)),
    }
}

/// Handler for GET /todolists/{list_id} that displays a list and its items.
#[tracing::instrument(skip(state))]
async fn show_list_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
) -> Result<Html<String>, WebError> {
    let list = ListService::new(state.repo.as_ref())
        .get_list(list_id)
        .await?;
    render_list_page(&state, list).await.map(Html)
}

/// Handler for serving the edit list form.
#[tracing::instrument(skip(state))]
async fn edit_list_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
) -> Result<Html<String>, WebError> {
    let list = ListService::new(state.repo.as_ref())
        .get_list(list_id)
        .await?;
    let name = list.name().to_string();
    let template = EditListTemplate::new(list, name, Vec::new());
    template.render().map(Html).map_err(WebError::from)
}

/// Handler for renaming a list via POST request.
#[tracing::instrument(skip(state))]
async fn update_list_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
    Form(form): Form<ListForm>,
) -> Result<Response, WebError> {
    let list_service = ListService::new(state.repo.as_ref());

    match list_service.update_list(list_id, form.name.clone()).await {
        Ok(list) => {
            let page = render_list_page(&state, list).await?;
            Ok(Html(page).into_response())
        }
        Err(ListServiceError::Validation(errors)) => {
            let list = list_service.get_list(list_id).await?;
            let template = EditListTemplate::new(list, form.name, errors.full_messages());
            let page = template.render()?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(WebError::from(err)),
    }
}

/// Handler for deleting a list and its items via POST request.
#[tracing::instrument(skip(state))]
async fn delete_list_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
) -> Result<Redirect, WebError> {
    ListService::new(state.repo.as_ref())
        .delete_list(list_id)
        .await?;
    Ok(notice_redirect("/todolists", "list_deleted"))
}

/// Handler for POST /todolists/{list_id}/complete_tasks that schedules bulk completion.
#[tracing::instrument(skip(state))]
async fn complete_tasks_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
) -> Result<Redirect, WebError> {
    state.jobs.enqueue_complete_list(list_id)?;
    Ok(notice_redirect("/todolists", "tasks_enqueued"))
}

/// Creates and returns the list router with all HTML list routes.
pub fn create_list_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/todolists", get(lists_handler).post(create_list_handler))
        .route("/todolists/new", get(new_list_handler))
        .route(
            "/todolists/{list_id}",
            get(show_list_handler).post(update_list_handler),
        )
        .route("/todolists/{list_id}/edit", get(edit_list_handler))
        .route("/todolists/{list_id}/delete", post(delete_list_handler))
        .route(
            "/todolists/{list_id}/complete_tasks",
            post(complete_tasks_handler),
        )
        .with_state(state)
}
