use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use super::test_utils::test_state;
use crate::routes::build_router;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrator = "pseudovision_core::MIGRATOR")]
async fn creates_a_schedule_with_a_slot(pool: PgPool) {
    let app = build_router(test_state(pool));

    let schedule = post(
        &app,
        "/api/schedules",
        json!({ "name": "Weekday Schedule" }),
    )
    .await;
    let schedule_id = schedule["id"].as_str().unwrap().to_string();
    assert_eq!(schedule["fixed_start_time_behavior"], "skip");

    let collection = post(
        &app,
        "/api/collections",
        json!({ "name": "Sitcoms", "kind": "playlist", "config": { "items": [] } }),
    )
    .await;
    let collection_id = collection["id"].as_str().unwrap().to_string();

    let slot = post(
        &app,
        &format!("/api/schedules/{schedule_id}/slots"),
        json!({
            "slot_index": 0,
            "anchor": "sequential",
            "fill_mode": "once",
            "collection_id": collection_id,
        }),
    )
    .await;
    let slot_id = slot["id"].as_str().unwrap().to_string();
    assert_eq!(slot["schedule_id"], schedule_id);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/schedules/{schedule_id}/slots"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let slots = body_json(response).await;
    assert_eq!(slots.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/schedules/{schedule_id}/slots/{slot_id}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "fill_mode": "flood" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["fill_mode"], "flood");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/schedules/{schedule_id}/slots/{slot_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrator = "pseudovision_core::MIGRATOR")]
async fn rejects_a_slot_with_neither_collection_nor_media_item(pool: PgPool) {
    let app = build_router(test_state(pool));
    let schedule = post(&app, "/api/schedules", json!({ "name": "Bad Schedule" })).await;
    let schedule_id = schedule["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/schedules/{schedule_id}/slots"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "slot_index": 0,
                        "anchor": "sequential",
                        "fill_mode": "once",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
