use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pseudovision_model::{Collection, CollectionId, CreateCollectionRequest, UpdateCollectionRequest};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn list_collections(State(state): State<AppState>) -> AppResult<Json<Vec<Collection>>> {
    Ok(Json(state.db.list_collections().await?))
}

pub async fn create_collection(
    State(state): State<AppState>,
    Json(req): Json<CreateCollectionRequest>,
) -> AppResult<(StatusCode, Json<Collection>)> {
    let collection = state.db.create_collection(req).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Collection>> {
    let collection = state
        .db
        .get_collection(CollectionId::from(id))
        .await?
        .ok_or_else(|| AppError::not_found("collection not found"))?;
    Ok(Json(collection))
}

pub async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCollectionRequest>,
) -> AppResult<Json<Collection>> {
    let collection = state
        .db
        .update_collection(CollectionId::from(id), req)
        .await?
        .ok_or_else(|| AppError::not_found("collection not found"))?;
    Ok(Json(collection))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.db.delete_collection(CollectionId::from(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("collection not found"))
    }
}
