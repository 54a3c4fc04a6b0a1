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

use crate::item::{Item, ItemChanges, ItemId, ItemService, ItemServiceError};
use crate::list::{ListId, ListService, TodoList};
use crate::web::{AppState, NoticeQuery, WebError, notice_redirect};

#[derive(Debug, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    description: String,
}

#[derive(Template)]
#[template(path = "todo_list_items/index.html")]
struct ItemsTemplate {
    list: TodoList,
    items: Vec<Item>,
    notice: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "todo_list_items/new.html")]
struct NewItemTemplate {
    list: TodoList,
    description: String,
    error_messages: Vec<String>,
    notice: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "todo_list_items/edit.html")]
struct EditItemTemplate {
    item: Item,
    description: String,
    error_messages: Vec<String>,
    notice: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "todo_list_items/show.html")]
struct ShowItemTemplate {
    item: Item,
    error_messages: Vec<String>,
    notice: Option<&'static str>,
}

impl ShowItemTemplate {
    fn new(item: Item, error_messages: Vec<String>) -> Self {
        Self {
            item,
            error_messages,
            notice: None,
        }
    }
}

async fn find_list(state: &AppState, list_id: ListId) -> Result<TodoList, WebError> {
    Ok(ListService::new(state.repo.as_ref())
        .get_list(list_id)
        .await?)
}

/// Handler for GET /todolists/{list_id}/todos.
#[tracing::instrument(skip(state))]
async fn items_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, WebError> {
    let list = find_list(&state, list_id).await?;
    let items = ItemService::new(state.repo.as_ref())
        .get_items(list_id)
        .await?;
    let template = ItemsTemplate {
        list,
        items,
        notice: query.message(),
    };
    template.render().map(Html).map_err(WebError::from)
}

/// Handler for serving the new item form.
#[tracing::instrument(skip(state))]
async fn new_item_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
) -> Result<Html<String>, WebError> {
    let list = find_list(&state, list_id).await?;
    let template = NewItemTemplate {
        list,
        description: String::new(),
        error_messages: Vec::new(),
        notice: None,
    };
    template.render().map(Html).map_err(WebError::from)
}

/// Handler for adding an item to a list via POST request.
#[tracing::instrument(skip(state))]
async fn create_item_handler(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<ListId>,
    Form(form): Form<ItemForm>,
) -> Result<Response, WebError> {
    let item_service = ItemService::new(state.repo.as_ref());

    match item_service
        .create_item(list_id, form.description.clone(), None)
        .await
    {
        Ok(item) => {
            let page = ShowItemTemplate::new(item, Vec::new()).render()?;
            Ok((StatusCode::CREATED, Html(page)).into_response())
        }
        Err(ItemServiceError::Validation(errors)) => {
            let template = NewItemTemplate {
                list: find_list(&state, list_id).await?,
                description: form.description,
                error_messages: errors.full_messages(),
                notice: None,
            };
            let page = template.render()?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(WebError::from(err)),
    }
}

/// Handler for GET /todolists/{list_id}/todos/{id}.
#[tracing::instrument(skip(state))]
async fn show_item_handler(
    State(state): State<Arc<AppState>>,
    Path((list_id, id)): Path<(ListId, ItemId)>,
) -> Result<Html<String>, WebError> {
    let item = ItemService::new(state.repo.as_ref())
        .get_item(list_id, id)
        .await?;
    let template = ShowItemTemplate::new(item, Vec::new());
    template.render().map(Html).map_err(WebError::from)
}

/// Handler for serving the edit item form.
#[tracing::instrument(skip(state))]
async fn edit_item_handler(
    State(state): State<Arc<AppState>>,
    Path((list_id, id)): Path<(ListId, ItemId)>,
) -> Result<Html<String>, WebError> {
    let item = ItemService::new(state.repo.as_ref())
        .get_item(list_id, id)
        .await?;
    let description = item.description().to_string();
    let template = EditItemTemplate {
        item,
        description,
        error_messages: Vec::new(),
        notice: None,
    };
    template.render().map(Html).map_err(WebError::from)
}

/// Handler for changing the description of an item via POST request.
#[tracing::instrument(skip(state))]
async fn update_item_handler(
    State(state): State<Arc<AppState>>,
    Path((list_id, id)): Path<(ListId, ItemId)>,
    Form(form): Form<ItemForm>,
) -> Result<Response, WebError> {
    let item_service = ItemService::new(state.repo.as_ref());
    let changes = ItemChanges::description(form.description.clone());

    match item_service.update_item(list_id, id, changes).await {
        Ok(item) => {
            let page = ShowItemTemplate::new(item, Vec::new()).render()?;
            Ok(Html(page).into_response())
        }
        Err(ItemServiceError::Validation(errors)) => {
            let template = EditItemTemplate {
                item: item_service.get_item(list_id, id).await?,
                description: form.description,
                error_messages: errors.full_messages(),
                notice: None,
            };
            let page = template.render()?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(WebError::from(err)),
    }
}

/// Handler for deleting an item via POST request.
#[tracing::instrument(skip(state))]
async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Path((list_id, id)): Path<(ListId, ItemId)>,
) -> Result<Redirect, WebError> {
    ItemService::new(state.repo.as_ref())
        .delete_item(list_id, id)
        .await?;
    Ok(notice_redirect(
        &format!("/todolists/{list_id}/todos"),
        "item_deleted",
    ))
}

/// Handler for POST /todolists/{list_id}/todos/{id}/complete_task.
///
/// Completing an already completed item shows the item again with the error.
#[tracing::instrument(skip(state))]
async fn complete_item_handler(
    State(state): State<Arc<AppState>>,
    Path((list_id, id)): Path<(ListId, ItemId)>,
) -> Result<Response, WebError> {
    let item_service = ItemService::new(state.repo.as_ref());

    match item_service.complete_item(list_id, id).await {
        Ok(_) => Ok(notice_redirect(
            &format!("/todolists/{list_id}/todos"),
            "item_completed",
        )
        .into_response()),
        Err(ItemServiceError::Validation(errors)) => {
            let item = item_service.get_item(list_id, id).await?;
            let page = ShowItemTemplate::new(item, errors.full_messages()).render()?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(WebError::from(err)),
    }
}

/// Creates and returns the item router with all HTML item routes.
pub fn create_item_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/todolists/{list_id}/todos",
            get(items_handler).post(create_item_handler),
        )
        .route("/todolists/{list_id}/todos/new", get(new_item_handler))
        .route(
            "/todolists/{list_id}/todos/{id}",
            get(show_item_handler).post(update_item_handler),
        )
        .route("/todolists/{list_id}/todos/{id}/edit", get(edit_item_handler))
        .route(
            "/todolists/{list_id}/todos/{id}/delete",
            post(delete_item_handler),
        )
        .route(
            "/todolists/{list_id}/todos/{id}/complete_task",
            post(complete_item_handler),
        )
        .with_state(state)
}
