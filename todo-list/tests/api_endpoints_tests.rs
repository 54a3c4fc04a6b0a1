use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;
use todo_list_server::worker::JobOutcome;
use tower::ServiceExt;

mod common;

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn can_create_and_list_todo_lists() {
    let ctx = common::setup_app();

    let response = send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "Setup project" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = common::body_json(response).await;
    assert_eq!(created, json!({ "id": 1, "name": "Setup project" }));

    let response = send(&ctx.app, empty_request(Method::GET, "/api/todolists")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_json(response).await,
        json!({ "todo_lists": [{ "id": 1, "name": "Setup project" }], "count": 1 })
    );
}

#[tokio::test]
async fn blank_list_name_is_unprocessable() {
    let ctx = common::setup_app();

    let response = send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        common::body_json(response).await,
        json!({ "name": ["can't be blank"] })
    );
}

#[tokio::test]
async fn missing_name_field_is_treated_as_blank() {
    let ctx = common::setup_app();

    let response = send(&ctx.app, json_request(Method::POST, "/api/todolists", json!({}))).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn can_rename_and_delete_todo_list() {
    let ctx = common::setup_app();
    send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "Groceries" })),
    )
    .await;

    let response = send(
        &ctx.app,
        json_request(Method::PUT, "/api/todolists/1", json!({ "name": "Chores" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["name"], "Chores");

    let response = send(&ctx.app, empty_request(Method::DELETE, "/api/todolists/1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response).await.is_empty());

    let response = send(&ctx.app, empty_request(Method::GET, "/api/todolists/1/todos")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Todo list with ID 1 not found");
}

#[tokio::test]
async fn can_manage_items_of_a_list() {
    let ctx = common::setup_app();
    send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "Setup project" })),
    )
    .await;

    let response = send(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/todolists/1/todos",
            json!({ "description": "Task 1" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        common::body_json(response).await,
        json!({ "id": 1, "description": "Task 1", "completed_at": null, "todo_list_id": 1 })
    );

    let response = send(
        &ctx.app,
        json_request(
            Method::PUT,
            "/api/todolists/1/todos/1",
            json!({ "description": "Task 1, revised" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&ctx.app, empty_request(Method::GET, "/api/todolists/1/todos")).await;
    let body = common::body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["todos"][0]["description"], "Task 1, revised");

    let response = send(
        &ctx.app,
        empty_request(Method::DELETE, "/api/todolists/1/todos/1"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response).await.is_empty());
    let response = send(&ctx.app, empty_request(Method::GET, "/api/todolists/1/todos")).await;
    assert_eq!(common::body_json(response).await["count"], 0);
}

#[tokio::test]
async fn put_without_name_leaves_list_unchanged() {
    let ctx = common::setup_app();
    send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "Groceries" })),
    )
    .await;

    let response = send(&ctx.app, json_request(Method::PUT, "/api/todolists/1", json!({}))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_json(response).await,
        json!({ "id": 1, "name": "Groceries" })
    );
}

#[tokio::test]
async fn put_without_name_on_missing_list_is_not_found() {
    let ctx = common::setup_app();

    let response = send(&ctx.app, json_request(Method::PUT, "/api/todolists/9", json!({}))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_without_description_leaves_item_unchanged() {
    let ctx = common::setup_app();
    send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "Setup project" })),
    )
    .await;
    send(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/todolists/1/todos",
            json!({ "description": "Task 1" }),
        ),
    )
    .await;

    let response = send(
        &ctx.app,
        json_request(Method::PUT, "/api/todolists/1/todos/1", json!({})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_json(response).await,
        json!({ "id": 1, "description": "Task 1", "completed_at": null, "todo_list_id": 1 })
    );
}

#[tokio::test]
async fn can_create_item_already_completed() {
    let ctx = common::setup_app();
    send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "Setup project" })),
    )
    .await;

    let response = send(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/todolists/1/todos",
            json!({ "description": "Task 1", "completed_at": "2024-09-19T08:30:00Z" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        common::body_json(response).await["completed_at"],
        "2024-09-19T08:30:00Z"
    );
}

#[tokio::test]
async fn completing_an_item_twice_is_unprocessable() {
    let ctx = common::setup_app();
    send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "Setup project" })),
    )
    .await;
    send(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/todolists/1/todos",
            json!({ "description": "Task 1" }),
        ),
    )
    .await;

    let response = send(
        &ctx.app,
        empty_request(Method::PUT, "/api/todolists/1/todos/1/complete_task"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_json(response).await["completed_at"].is_string());

    let response = send(
        &ctx.app,
        empty_request(Method::PUT, "/api/todolists/1/todos/1/complete_task"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        common::body_json(response).await,
        json!({ "completed_at": ["already completed"] })
    );
}

#[tokio::test]
async fn item_of_another_list_is_not_found() {
    let ctx = common::setup_app();
    for name in ["First", "Second"] {
        send(
            &ctx.app,
            json_request(Method::POST, "/api/todolists", json!({ "name": name })),
        )
        .await;
    }
    send(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/todolists/1/todos",
            json!({ "description": "Task 1" }),
        ),
    )
    .await;

    let response = send(
        &ctx.app,
        empty_request(Method::PUT, "/api/todolists/2/todos/1/complete_task"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn complete_tasks_returns_before_items_are_completed() {
    let mut ctx = common::setup_app();
    send(
        &ctx.app,
        json_request(Method::POST, "/api/todolists", json!({ "name": "Setup project" })),
    )
    .await;
    for description in ["Task 1", "Task 2"] {
        send(
            &ctx.app,
            json_request(
                Method::POST,
                "/api/todolists/1/todos",
                json!({ "description": description }),
            ),
        )
        .await;
    }

    let response = send(
        &ctx.app,
        empty_request(Method::PUT, "/api/todolists/1/complete_tasks"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&ctx.app, empty_request(Method::GET, "/api/todolists/1/todos")).await;
    let body = common::body_json(response).await;
    assert!(body["todos"][0]["completed_at"].is_null());

    let outcome = ctx.completer.run_once().await;
    assert_eq!(
        outcome,
        Some(JobOutcome::Completed {
            completed: 2,
            failed: 0
        })
    );

    let response = send(&ctx.app, empty_request(Method::GET, "/api/todolists/1/todos")).await;
    let body = common::body_json(response).await;
    assert!(body["todos"][0]["completed_at"].is_string());
    assert!(body["todos"][1]["completed_at"].is_string());
}

#[tokio::test]
async fn complete_tasks_accepts_unknown_list() {
    let mut ctx = common::setup_app();

    let response = send(
        &ctx.app,
        empty_request(Method::PUT, "/api/todolists/42/complete_tasks"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.completer.run_once().await, Some(JobOutcome::ListNotFound));
}

#[tokio::test]
async fn full_queue_is_service_unavailable() {
    let ctx = common::setup_app_with(todo_list_server::worker::WorkerConfig {
        queue_capacity: 1,
        ..Default::default()
    });
    send(
        &ctx.app,
        empty_request(Method::PUT, "/api/todolists/1/complete_tasks"),
    )
    .await;

    let response = send(
        &ctx.app,
        empty_request(Method::PUT, "/api/todolists/1/complete_tasks"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(common::body_json(response).await["error"], "service_unavailable");
}

#[tokio::test]
async fn storage_failure_is_internal_server_error() {
    let ctx = common::setup_app();
    ctx.repo.set_unavailable(true);

    let response = send(&ctx.app, empty_request(Method::GET, "/api/todolists")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        common::body_json(response).await["error"],
        "internal_server_error"
    );
}

#[tokio::test]
async fn serves_openapi_document() {
    let ctx = common::setup_app();

    let response = send(&ctx.app, empty_request(Method::GET, "/api/openapi.json")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let doc = common::body_json(response).await;
    assert!(doc["paths"]["/api/todolists/{list_id}/todos"].is_object());
}
