use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tower::ServiceExt;

use super::test_utils::test_state;
use crate::routes::build_router;

#[sqlx::test(migrator = "pseudovision_core::MIGRATOR")]
async fn health_endpoint_reports_ok(pool: PgPool) {
    let app = build_router(test_state(pool));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
