//! Route table, following `ferrex-server::routes::v1`'s
//! `Router<AppState>`-returning builder pattern.

use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{channels, collections, health, playout, schedules};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .merge(channel_routes())
        .merge(schedule_routes())
        .merge(collection_routes())
        .merge(playout_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .with_state(state)
}

fn channel_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/channels",
            get(channels::list_channels).post(channels::create_channel),
        )
        .route(
            "/api/channels/{id}",
            get(channels::get_channel)
                .put(channels::update_channel)
                .delete(channels::delete_channel),
        )
}

fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/schedules",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route(
            "/api/schedules/{id}",
            get(schedules::get_schedule)
                .put(schedules::update_schedule)
                .delete(schedules::delete_schedule),
        )
        .route(
            "/api/schedules/{id}/slots",
            get(schedules::list_slots).post(schedules::create_slot),
        )
        .route(
            "/api/schedules/{id}/slots/{slot_id}",
            put(schedules::update_slot).delete(schedules::delete_slot),
        )
}

fn collection_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/collections",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/api/collections/{id}",
            get(collections::get_collection)
                .put(collections::update_collection)
                .delete(collections::delete_collection),
        )
}

fn playout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/channels/{channel_id}/playout",
            get(playout::get_playout).post(playout::trigger_build),
        )
        .route(
            "/api/channels/{channel_id}/playout/events",
            get(playout::list_events).post(playout::create_manual_event),
        )
        .route(
            "/api/channels/{channel_id}/playout/events/{id}",
            put(playout::update_manual_event).delete(playout::delete_manual_event),
        )
}

/// Permissive in the common single-origin-unset case (`*`, the default),
/// scoped to the configured list otherwise.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any);
    if allowed_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
