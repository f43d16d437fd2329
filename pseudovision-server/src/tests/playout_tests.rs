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

#[sqlx::test(migrator = "pseudovision_core::MIGRATOR")]
async fn triggering_a_build_without_a_schedule_reports_no_schedule(pool: PgPool) {
    let app = build_router(test_state(pool));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/channels")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "name": "Unscheduled", "number": 9 }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let channel = body_json(response).await;
    let channel_id = channel["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/channels/{channel_id}/playout"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let build = body_json(response).await;
    assert_eq!(build["outcome"], "no_schedule");
    assert_eq!(build["events_emitted"], 0);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/channels/{channel_id}/playout"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let playout = body_json(response).await;
    assert_eq!(playout["channel_id"], channel_id);
}

#[sqlx::test(migrator = "pseudovision_core::MIGRATOR")]
async fn triggering_a_build_for_an_unknown_channel_is_404(pool: PgPool) {
    let app = build_router(test_state(pool));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/channels/{}/playout", uuid::Uuid::now_v7()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "pseudovision_core::MIGRATOR")]
async fn manages_manual_events_on_a_playout(pool: PgPool) {
    let media_item_id: uuid::Uuid =
        sqlx::query_scalar("INSERT INTO media_items (title) VALUES ($1) RETURNING id")
            .bind("Special Report")
            .fetch_one(&pool)
            .await
            .unwrap();

    let app = build_router(test_state(pool));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/channels")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "name": "Overlay Channel", "number": 3 }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let channel = body_json(response).await;
    let channel_id = channel["id"].as_str().unwrap().to_string();

    // A playout row only exists once a build has been triggered.
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/channels/{channel_id}/playout"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let start_at = chrono::Utc::now() + chrono::Duration::hours(1);
    let finish_at = start_at + chrono::Duration::minutes(30);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/channels/{channel_id}/playout/events"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "media_item_id": media_item_id,
                        "kind": "content",
                        "start_at": start_at,
                        "finish_at": finish_at,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let event = body_json(response).await;
    let event_id = event["id"].as_str().unwrap().to_string();
    assert_eq!(event["is_manual"], true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/channels/{channel_id}/playout/events"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let events = body_json(response).await;
    assert_eq!(events.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/channels/{channel_id}/playout/events/{event_id}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "custom_title": "Breaking News" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["custom_title"], "Breaking News");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/channels/{channel_id}/playout/events/{event_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
