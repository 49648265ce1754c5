//! End-to-end tests for the `/v1/games` routes backed by the in-memory store.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use game_provider_service::{
    dao::game_store::{GameStore, memory::MemoryGameStore},
    routes,
};
use serde_json::json;

use common::{error_messages, router_with_store, send, test_state};

async fn memory_router() -> axum::Router {
    router_with_store(test_state(3), Arc::new(MemoryGameStore::new())).await
}

#[tokio::test]
async fn full_lifecycle_of_a_game() -> Result<(), String> {
    let router = memory_router().await;

    let created = json!({
        "name": "A",
        "dateOfCreation": "2024-01-15T10:30:00Z",
        "active": false
    });
    let (status, body) = send(&router, Method::POST, "/v1/games", Some(created.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, body) = send(&router, Method::GET, "/v1/games", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([created.clone()]));

    let (status, body) = send(&router, Method::GET, "/v1/games/A", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let updated = json!({
        "name": "A",
        "dateOfCreation": "2025-06-01T08:00:00Z",
        "active": true
    });
    let (status, body) = send(&router, Method::PUT, "/v1/games", Some(updated.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, updated);

    let (_, body) = send(&router, Method::GET, "/v1/games", None).await?;
    assert_eq!(body, json!([updated]));

    let (status, body) = send(&router, Method::DELETE, "/v1/games/A", None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = send(&router, Method::GET, "/v1/games", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn timestamps_are_returned_in_utc() -> Result<(), String> {
    let router = memory_router().await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/v1/games",
        Some(json!({"name": "Offset", "dateOfCreation": "2024-01-15T12:30:00+02:00"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dateOfCreation"], "2024-01-15T10:30:00Z");
    assert!(body["active"].is_null());
    Ok(())
}

#[tokio::test]
async fn duplicate_create_is_rejected() -> Result<(), String> {
    let router = memory_router().await;
    let first = json!({"name": "A", "active": false});

    send(&router, Method::POST, "/v1/games", Some(first.clone())).await?;
    let (status, body) = send(
        &router,
        Method::POST,
        "/v1/games",
        Some(json!({"name": "A", "active": true})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_messages(&body), ["The game [A] already exists"]);

    let (_, stored) = send(&router, Method::GET, "/v1/games/A", None).await?;
    assert_eq!(stored["active"], false);
    Ok(())
}

#[tokio::test]
async fn blank_or_missing_names_fail_validation() -> Result<(), String> {
    let router = memory_router().await;

    for payload in [
        json!({"name": "   ", "active": true}),
        json!({"name": null}),
        json!({}),
    ] {
        let (status, body) = send(&router, Method::POST, "/v1/games", Some(payload)).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            error_messages(&body),
            ["'name' has an invalid value 'must not be blank'"]
        );
    }

    let (status, body) = send(
        &router,
        Method::PUT,
        "/v1/games",
        Some(json!({"name": ""})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_messages(&body).len(), 1);
    Ok(())
}

#[tokio::test]
async fn blank_path_name_is_a_bad_request() -> Result<(), String> {
    let router = memory_router().await;

    let (status, body) = send(&router, Method::GET, "/v1/games/%20", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_messages(&body),
        ["'name' has an invalid value 'must not be blank'"]
    );
    Ok(())
}

#[tokio::test]
async fn unknown_names_are_not_found() -> Result<(), String> {
    let router = memory_router().await;
    let expected = ["Cannot find any game with Name [Ghost]"];

    let (status, body) = send(&router, Method::GET, "/v1/games/Ghost", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_messages(&body), expected);

    let (status, body) = send(
        &router,
        Method::PUT,
        "/v1/games",
        Some(json!({"name": "Ghost", "active": true})),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_messages(&body), expected);

    let (status, body) = send(&router, Method::DELETE, "/v1/games/Ghost", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_messages(&body), expected);
    Ok(())
}

#[tokio::test]
async fn reads_do_not_mutate_state() -> Result<(), String> {
    let store = MemoryGameStore::new();
    let router = router_with_store(test_state(3), Arc::new(store.clone())).await;
    send(
        &router,
        Method::POST,
        "/v1/games",
        Some(json!({"name": "A", "active": true})),
    )
    .await?;

    for _ in 0..3 {
        send(&router, Method::GET, "/v1/games", None).await?;
        send(&router, Method::GET, "/v1/games/A", None).await?;
    }

    let stored = GameStore::find_all(&store)
        .await
        .map_err(|err| format!("list games: {err}"))?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].version, 0);
    Ok(())
}

#[tokio::test]
async fn degraded_mode_answers_service_unavailable() -> Result<(), String> {
    let router = routes::router(test_state(3));

    let (status, body) = send(&router, Method::GET, "/v1/games", None).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_messages(&body).len(), 1);

    let (status, body) = send(&router, Method::GET, "/healthcheck", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "degraded"}));
    Ok(())
}

#[tokio::test]
async fn healthcheck_reports_ok_with_storage() -> Result<(), String> {
    let router = memory_router().await;

    let (status, body) = send(&router, Method::GET, "/healthcheck", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<(), String> {
    let router = memory_router().await;

    let (status, body) = send(&router, Method::GET, "/api-doc/openapi.json", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/games"].is_object());
    Ok(())
}
