use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pseudovision_model::{
    CreateScheduleRequest, CreateSlotRequest, Schedule, ScheduleId, Slot, SlotId,
    UpdateScheduleRequest, UpdateSlotRequest,
};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn list_schedules(State(state): State<AppState>) -> AppResult<Json<Vec<Schedule>>> {
    Ok(Json(state.db.list_schedules().await?))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<CreateScheduleRequest>,
) -> AppResult<(StatusCode, Json<Schedule>)> {
    let schedule = state.db.create_schedule(req).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Schedule>> {
    let schedule = state
        .db
        .get_schedule(ScheduleId::from(id))
        .await?
        .ok_or_else(|| AppError::not_found("schedule not found"))?;
    Ok(Json(schedule))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateScheduleRequest>,
) -> AppResult<Json<Schedule>> {
    let schedule = state
        .db
        .update_schedule(ScheduleId::from(id), req)
        .await?
        .ok_or_else(|| AppError::not_found("schedule not found"))?;
    Ok(Json(schedule))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.db.delete_schedule(ScheduleId::from(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("schedule not found"))
    }
}

pub async fn list_slots(
    State(state): State<AppState>,
    Path(schedule_id): Path<Uuid>,
) -> AppResult<Json<Vec<Slot>>> {
    Ok(Json(state.db.list_slots(ScheduleId::from(schedule_id)).await?))
}

pub async fn create_slot(
    State(state): State<AppState>,
    Path(schedule_id): Path<Uuid>,
    Json(req): Json<CreateSlotRequest>,
) -> AppResult<(StatusCode, Json<Slot>)> {
    let slot = state
        .db
        .create_slot(ScheduleId::from(schedule_id), req)
        .await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

pub async fn update_slot(
    State(state): State<AppState>,
    Path((_schedule_id, slot_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateSlotRequest>,
) -> AppResult<Json<Slot>> {
    let slot = state
        .db
        .update_slot(SlotId::from(slot_id), req)
        .await?
        .ok_or_else(|| AppError::not_found("slot not found"))?;
    Ok(Json(slot))
}

pub async fn delete_slot(
    State(state): State<AppState>,
    Path((_schedule_id, slot_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    if state.db.delete_slot(SlotId::from(slot_id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("slot not found"))
    }
}
