use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{MoveStickerRequest, Sticker, StickerQuery},
    queries::sticker_queries,
    services::upload_service::{self, MAX_STICKERS_PER_UPLOAD},
};

pub async fn list_stickers(
    State(state): State<AppState>,
    Query(params): Query<StickerQuery>,
) -> Result<Json<Vec<Sticker>>> {
    let stickers = sticker_queries::list_stickers(&state.db, &params).await?;

    Ok(Json(stickers))
}

pub async fn list_public_stickers(
    State(state): State<AppState>,
    Query(params): Query<StickerQuery>,
) -> Result<Json<Vec<Sticker>>> {
    let stickers = sticker_queries::list_public_stickers(&state.db, params.category_id).await?;

    Ok(Json(stickers))
}

/// Multipart body: a `category_id` text field plus up to 50 image files.
pub async fn upload_stickers(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Vec<Sticker>>> {
    let form = upload_service::collect_upload(multipart, MAX_STICKERS_PER_UPLOAD).await?;

    let category_id: i32 = form
        .field("category_id")
        .ok_or_else(|| AppError::BadRequest("category_id is required".to_string()))?
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("category_id must be an integer".to_string()))?;

    if sticker_queries::find_category(&state.db, category_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "Sticker category {} not found",
            category_id
        )));
    }

    let prefix = state.environment.storage_prefix("stickers");
    let stored = state.storage.put_batch(&prefix, &form.files).await?;
    let entries: Vec<_> = form.files.iter().zip(stored).collect();

    match sticker_queries::create_stickers(&state.db, category_id, &entries).await {
        Ok(stickers) => {
            tracing::info!(
                "Uploaded {} stickers into category {}",
                stickers.len(),
                category_id
            );
            Ok(Json(stickers))
        }
        Err(e) => {
            let keys: Vec<String> = entries.iter().map(|(_, object)| object.key.clone()).collect();
            state.storage.delete_keys(&keys).await;
            Err(e)
        }
    }
}

pub async fn toggle_sticker(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Sticker>> {
    let sticker = sticker_queries::toggle_sticker(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(sticker))
}

pub async fn move_sticker(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<MoveStickerRequest>,
) -> Result<Json<Sticker>> {
    if sticker_queries::find_category(&state.db, payload.category_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "Sticker category {} not found",
            payload.category_id
        )));
    }

    let sticker = sticker_queries::move_sticker(&state.db, id, payload.category_id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(sticker))
}

pub async fn delete_sticker(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let sticker = sticker_queries::delete_sticker(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    state.storage.delete_keys(&[sticker.storage_key]).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn use_sticker(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Sticker>> {
    let sticker = sticker_queries::increment_usage(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(sticker))
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Sticker {} not found", id))
}
