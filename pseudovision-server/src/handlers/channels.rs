use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pseudovision_model::{Channel, ChannelId, CreateChannelRequest, UpdateChannelRequest};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn list_channels(State(state): State<AppState>) -> AppResult<Json<Vec<Channel>>> {
    Ok(Json(state.db.list_channels().await?))
}

pub async fn create_channel(
    State(state): State<AppState>,
    Json(req): Json<CreateChannelRequest>,
) -> AppResult<(StatusCode, Json<Channel>)> {
    let channel = state.db.create_channel(req).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn get_channel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Channel>> {
    let channel = state
        .db
        .get_channel(ChannelId::from(id))
        .await?
        .ok_or_else(|| AppError::not_found("channel not found"))?;
    Ok(Json(channel))
}

pub async fn update_channel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateChannelRequest>,
) -> AppResult<Json<Channel>> {
    let channel = state
        .db
        .update_channel(ChannelId::from(id), req)
        .await?
        .ok_or_else(|| AppError::not_found("channel not found"))?;
    Ok(Json(channel))
}

pub async fn delete_channel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.db.delete_channel(ChannelId::from(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("channel not found"))
    }
}
