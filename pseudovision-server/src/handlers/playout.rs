//! Playout endpoints: fetch the compiled timeline, trigger a (re)build,
//! and manage manual event overlays.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pseudovision_core::SystemClock;
use pseudovision_model::{
    ChannelId, CreateManualEventRequest, Event, EventId, Playout, UpdateManualEventRequest,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default = "default_event_limit")]
    limit: i64,
}

fn default_event_limit() -> i64 {
    500
}

const MAX_EVENT_LIMIT: i64 = 500;

pub async fn get_playout(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<Json<Playout>> {
    let playout = state
        .db
        .get_playout_by_channel(ChannelId::from(channel_id))
        .await?
        .ok_or_else(|| AppError::not_found("playout not found"))?;
    Ok(Json(playout))
}

/// `POST /api/channels/:channel-id/playout` — upserts the Playout row
/// (created once per channel) then runs `build` inline, returning the
/// summary alongside a human-readable message. The HTTP rebuild
/// endpoint runs synchronously rather than enqueuing work.
pub async fn trigger_build(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let channel = state
        .db
        .get_channel(ChannelId::from(channel_id))
        .await?
        .ok_or_else(|| AppError::not_found("channel not found"))?;

    let playout = state
        .db
        .get_or_create_playout(&channel, rand::random::<i64>())
        .await?;

    let opts = state.config.build_options();
    let summary = state
        .db
        .build_playout(&opts, &playout, &SystemClock)
        .await?;

    let message = match &summary.outcome {
        pseudovision_core::BuildOutcome::Built => "build completed".to_string(),
        pseudovision_core::BuildOutcome::NoSchedule => {
            "playout has no schedule; nothing to build".to_string()
        }
        pseudovision_core::BuildOutcome::Failed(reason) => format!("build failed: {reason}"),
    };

    let mut body = json!({ "message": message });
    body["events_emitted"] = json!(summary.events_emitted);
    body["warnings"] = json!(summary.warnings);
    body["outcome"] = serde_json::to_value(&summary.outcome).unwrap_or(Value::Null);
    Ok(Json(body))
}

pub async fn list_events(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Query(query): Query<EventsQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let playout = state
        .db
        .get_playout_by_channel(ChannelId::from(channel_id))
        .await?
        .ok_or_else(|| AppError::not_found("playout not found"))?;
    let limit = query.limit.clamp(1, MAX_EVENT_LIMIT);
    let events = state
        .db
        .list_upcoming_events(playout.id, chrono::Utc::now(), limit)
        .await?;
    Ok(Json(events))
}

pub async fn create_manual_event(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Json(req): Json<CreateManualEventRequest>,
) -> AppResult<(StatusCode, Json<Event>)> {
    let playout = state
        .db
        .get_playout_by_channel(ChannelId::from(channel_id))
        .await?
        .ok_or_else(|| AppError::not_found("playout not found"))?;

    let event = Event {
        id: EventId::new(),
        playout_id: playout.id,
        media_item_id: Some(req.media_item_id),
        kind: req.kind,
        start_at: req.start_at,
        finish_at: req.finish_at,
        guide_group: 0,
        slot_id: None,
        is_manual: true,
        custom_title: req.custom_title,
        in_point: req.in_point,
        out_point: req.out_point,
    };
    state.db.create_manual_event(&event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_manual_event(
    State(state): State<AppState>,
    Path((_channel_id, event_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateManualEventRequest>,
) -> AppResult<Json<Event>> {
    let event = state
        .db
        .update_manual_event(EventId::from(event_id), req)
        .await?
        .ok_or_else(|| AppError::not_found("manual event not found"))?;
    Ok(Json(event))
}

pub async fn delete_manual_event(
    State(state): State<AppState>,
    Path((_channel_id, event_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    if state.db.delete_manual_event(EventId::from(event_id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("manual event not found"))
    }
}
